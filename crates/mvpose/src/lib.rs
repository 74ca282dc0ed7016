#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use mvpose_3d as m3d;

#[doc(inline)]
pub use mvpose_select as select;
