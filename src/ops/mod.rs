pub mod kernel;
pub mod raster;
pub mod scalar;

pub use kernel::{KernelMapOp, KernelMethod};
pub use raster::RasterSourceOp;
pub use scalar::ScalarOp;
