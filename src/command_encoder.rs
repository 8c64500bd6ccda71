pub trait CommandEncoderExt {
    fn with_debug_group<A>(&mut self, label: &str, function: impl FnOnce(&mut Self) -> A) -> A;

    fn with_render_pass<'pass, A>(
        &'pass mut self,
        descriptor: &wgpu::RenderPassDescriptor<'pass, '_>,
        function: impl FnOnce(&mut wgpu::RenderPass<'pass>) -> A,
    ) -> A;
}

impl CommandEncoderExt for wgpu::CommandEncoder {
    fn with_debug_group<A>(&mut self, label: &str, function: impl FnOnce(&mut Self) -> A) -> A {
        self.push_debug_group(label);
        let result = function(self);
        self.pop_debug_group();
        result
    }

    fn with_render_pass<'pass, A>(
        &'pass mut self,
        descriptor: &wgpu::RenderPassDescriptor<'pass, '_>,
        function: impl FnOnce(&mut wgpu::RenderPass<'pass>) -> A,
    ) -> A {
        let mut render_pass = self.begin_render_pass(descriptor);
        function(&mut render_pass)
    }
}
