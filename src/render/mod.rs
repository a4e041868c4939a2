pub(crate) mod coords;
pub(crate) mod cpu;
pub(crate) mod framebuffer;
pub(crate) mod painter;
pub(crate) mod texture;
