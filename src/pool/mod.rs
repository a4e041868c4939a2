pub(crate) mod framed;
pub(crate) mod layer;
pub(crate) mod method;
pub(crate) mod object;
#[allow(clippy::module_inception)]
pub(crate) mod pool;
pub(crate) mod settings;
pub(crate) mod state;
