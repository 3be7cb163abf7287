// System Layer
pub mod codec;

pub use codec::{fs_modified, NameEncoding, ZipCodec, ZipCodecWriter};
