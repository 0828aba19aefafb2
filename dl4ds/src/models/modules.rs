mod attention;
mod conv_blocks;
mod dropout;
mod localized_conv;
mod pad_concat;
mod upsampling;
mod utils;

pub use attention::*;
pub use conv_blocks::*;
pub use dropout::*;
pub use localized_conv::*;
pub use pad_concat::*;
pub use upsampling::*;
pub use utils::*;
