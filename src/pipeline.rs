//! Per-frame orchestration of the simulation and its presentation.

use log::trace;

use crate::{
    attractor::AttractorState,
    config::FrameSettings,
    pixel::{PixelBuffer, Plot},
};

/// Where a finished frame goes. Only ever sees the pixel buffer read-only.
pub trait Presenter {
    type Error;

    /// Clear the drawable surface ahead of the frame.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Show `pixels`. Called once the frame's decay and plotting are complete.
    fn draw(&mut self, pixels: &PixelBuffer) -> Result<(), Self::Error>;
}

pub struct FrameUpdatePipeline<P> {
    pixels: PixelBuffer,
    attractor: AttractorState,
    presenter: P,
    settings: FrameSettings,
    frames: u64,
}

impl<P: Presenter> FrameUpdatePipeline<P> {
    pub fn new(
        pixels: PixelBuffer,
        attractor: AttractorState,
        presenter: P,
        settings: FrameSettings,
    ) -> Self {
        Self {
            pixels,
            attractor,
            presenter,
            settings,
            frames: 0,
        }
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn attractor(&self) -> &AttractorState {
        &self.attractor
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Frames that ran to completion.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Clear, decay, drift the attractor, plot `settings.iterations` points, then draw.
    ///
    /// A presenter error aborts the frame; nothing is retried.
    pub fn update_frame(&mut self) -> Result<(), P::Error> {
        self.presenter.clear()?;

        self.pixels.decay(self.settings.decay_factor);
        self.attractor.advance_phase();

        let mut clamped = 0usize;
        let mut skipped = 0usize;
        for _ in 0..self.settings.iterations {
            let point = self.attractor.step();
            match self.pixels.plot(point.x, point.y) {
                Plot::Inside { .. } => {}
                Plot::Clamped { .. } => clamped += 1,
                Plot::Skipped => skipped += 1,
            }
        }

        self.presenter.draw(&self.pixels)?;

        self.frames += 1;
        trace!(
            "frame {}: {} points, {} clamped, {} skipped, now at {:?} with {:?}",
            self.frames,
            self.settings.iterations,
            clamped,
            skipped,
            self.attractor.point(),
            self.attractor.parameters()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::{attractor::Point, pixel::Rgba};

    #[derive(Debug, PartialEq)]
    enum Call {
        Clear,
        Draw(Vec<u8>),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl Presenter for Recorder {
        type Error = Infallible;

        fn clear(&mut self) -> Result<(), Infallible> {
            self.calls.push(Call::Clear);
            Ok(())
        }

        fn draw(&mut self, pixels: &PixelBuffer) -> Result<(), Infallible> {
            self.calls.push(Call::Draw(pixels.as_bytes().to_vec()));
            Ok(())
        }
    }

    #[derive(Debug, PartialEq)]
    struct Lost;

    struct FailingClear;

    impl Presenter for FailingClear {
        type Error = Lost;

        fn clear(&mut self) -> Result<(), Lost> {
            Err(Lost)
        }

        fn draw(&mut self, _: &PixelBuffer) -> Result<(), Lost> {
            panic!("draw after failed clear");
        }
    }

    fn pipeline<P: Presenter>(presenter: P, iterations: usize) -> FrameUpdatePipeline<P> {
        FrameUpdatePipeline::new(
            PixelBuffer::new(512).unwrap(),
            AttractorState::new(),
            presenter,
            FrameSettings {
                iterations,
                ..FrameSettings::default()
            },
        )
    }

    #[test]
    fn default_settings() {
        let settings = FrameSettings::default();
        assert_eq!(settings.decay_factor, 0.9);
        assert_eq!(settings.iterations, 100_000);
    }

    #[test]
    fn clears_then_draws_the_finished_buffer() {
        let mut pipeline = pipeline(Recorder::default(), 2_000);
        pipeline.update_frame().unwrap();
        pipeline.update_frame().unwrap();

        let final_bytes = pipeline.pixels().as_bytes().to_vec();
        let calls = &pipeline.presenter_mut().calls;
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], Call::Clear);
        assert!(matches!(calls[1], Call::Draw(_)));
        assert_eq!(calls[2], Call::Clear);
        assert_eq!(calls[3], Call::Draw(final_bytes));
        assert_eq!(pipeline.frames(), 2);
    }

    #[test]
    fn frame_matches_manual_sequence() {
        let mut pipeline = pipeline(Recorder::default(), 500);
        pipeline.update_frame().unwrap();

        let mut pixels = PixelBuffer::new(512).unwrap();
        let mut attractor = AttractorState::new();
        pixels.decay(0.9);
        attractor.advance_phase();
        for _ in 0..500 {
            let Point { x, y } = attractor.step();
            pixels.plot(x, y);
        }

        assert_eq!(pipeline.attractor(), &attractor);
        assert_eq!(pipeline.pixels().as_bytes(), pixels.as_bytes());
    }

    #[test]
    fn replay_is_deterministic() {
        let mut first = pipeline(Recorder::default(), 10_000);
        let mut second = pipeline(Recorder::default(), 10_000);
        for _ in 0..5 {
            first.update_frame().unwrap();
            second.update_frame().unwrap();
        }

        assert_eq!(first.pixels().as_bytes(), second.pixels().as_bytes());
        assert_eq!(first.attractor(), second.attractor());
        assert!(first.pixels().as_bytes().iter().any(|byte| *byte != 0));
    }

    #[test]
    fn trails_fade_without_new_points() {
        let mut pipeline = pipeline(Recorder::default(), 5_000);
        pipeline.update_frame().unwrap();
        assert!(pipeline.pixels().as_bytes().iter().any(|byte| *byte != 0));

        pipeline.settings.iterations = 0;
        // 255 * 0.9^53 < 1
        for _ in 0..53 {
            pipeline.update_frame().unwrap();
        }
        assert!(pipeline.pixels().as_bytes().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn earlier_points_fade_by_decay_factor() {
        let mut pipeline = pipeline(Recorder::default(), 1);
        pipeline.update_frame().unwrap();
        let first = pipeline.attractor().point();

        pipeline.settings.iterations = 0;
        pipeline.update_frame().unwrap();

        let mut expected = PixelBuffer::new(512).unwrap();
        let Plot::Inside { column, row } = expected.plot(first.x, first.y) else {
            panic!("first point should land inside");
        };
        let Rgba { r, g, b, a } = expected.pixel(column, row).unwrap();
        let decayed = |channel: u8| (channel as f64 * 0.9) as u8;
        assert_eq!(
            pipeline.pixels().pixel(column, row),
            Some(Rgba {
                r: decayed(r),
                g: decayed(g),
                b: decayed(b),
                a: decayed(a),
            })
        );
    }

    #[test]
    fn presenter_failure_aborts_frame() {
        let mut pipeline = pipeline(FailingClear, 1_000);
        assert_eq!(pipeline.update_frame(), Err(Lost));
        assert_eq!(pipeline.frames(), 0);
        assert_eq!(pipeline.attractor(), &AttractorState::new());
        assert!(pipeline.pixels().as_bytes().iter().all(|byte| *byte == 0));
    }
}
