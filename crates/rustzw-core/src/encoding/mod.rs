/// Zero-copy byte reader for decoding frames and command payloads.
pub mod reader;
/// Byte writer for encoding frames into a caller-owned buffer.
pub mod writer;
