//! Error types for `AllodsBin`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `AllodsBin` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Container Errors ====================
    /// A blob reference points at a missing segment or past its end.
    #[error("blob {container_id} out of range: requested {requested} bytes, {available} available")]
    OutOfRange {
        /// The segment id from the blob reference.
        container_id: u32,
        /// The byte length requested by the reference.
        requested: usize,
        /// Bytes available in the segment (0 when the segment does not exist).
        available: usize,
    },

    /// A `.bin` segment stream declares more bytes than the file holds.
    #[error("segment {index} at offset {offset} declares {expected} bytes, {actual} remain")]
    TruncatedSegment {
        /// Ordinal of the segment in the stream.
        index: usize,
        /// Byte offset of the segment's length prefix.
        offset: usize,
        /// Declared segment length.
        expected: usize,
        /// Bytes remaining after the prefix.
        actual: usize,
    },

    // ==================== Vertex Errors ====================
    /// A vertex component reads past the record stride.
    #[error("malformed vertex layout: {component} at offset {offset} (+{size} bytes) exceeds stride {stride}")]
    MalformedLayout {
        /// Semantic name of the offending component.
        component: &'static str,
        /// Component byte offset.
        offset: usize,
        /// Encoded element size.
        size: usize,
        /// Record stride.
        stride: usize,
    },

    /// The vertex element type name is not known.
    #[error("unknown vertex element type: {0}")]
    UnknownElementType(String),

    /// The buffer is shorter than a single vertex record.
    #[error("vertex buffer truncated: {actual} bytes, stride is {stride}")]
    TruncatedBuffer {
        /// Record stride.
        stride: usize,
        /// Buffer length.
        actual: usize,
    },

    // ==================== Geometry Errors ====================
    /// A geometry fragment's index range is inconsistent.
    #[error("invalid geometry fragment: index range {begin}..{end} over {buffer_len} bytes")]
    InvalidFragment {
        /// Index range start in bytes.
        begin: usize,
        /// Index range end in bytes.
        end: usize,
        /// Size of the owning index buffer in bytes.
        buffer_len: usize,
    },

    /// A triangle references a vertex that was not decoded.
    #[error("triangle references vertex {index}, only {vertex_count} decoded")]
    VertexIndexOutOfRange {
        /// The referenced vertex index.
        index: u16,
        /// Number of decoded vertices.
        vertex_count: usize,
    },

    // ==================== Skeleton Errors ====================
    /// The skeleton buffer ends inside the header or a bone record.
    #[error("malformed bone record {index} at offset {offset}: expected {expected} bytes, {actual} available")]
    MalformedRecord {
        /// Bone index (or 0 for the header).
        index: usize,
        /// Byte offset of the record.
        offset: usize,
        /// Bytes required for the record.
        expected: usize,
        /// Bytes remaining in the buffer.
        actual: usize,
    },

    /// A bone's parent chain never reaches a root.
    #[error("cyclic bone hierarchy at bone {bone}")]
    CyclicHierarchy {
        /// Bone whose ancestor walk did not terminate.
        bone: usize,
    },

    /// A caller asked for a bone the table does not have.
    #[error("bone {index} out of range, skeleton has {bone_count} bones")]
    BoneOutOfRange {
        /// Requested bone position.
        index: usize,
        /// Number of bones in the table.
        bone_count: usize,
    },

    /// A bone's parent index is outside the bone table.
    #[error("bone {bone} has parent {parent}, skeleton has {bone_count} bones")]
    InvalidParent {
        /// The child bone.
        bone: usize,
        /// The out-of-range parent index.
        parent: u16,
        /// Number of bones in the table.
        bone_count: usize,
    },

    // ==================== Texture Errors ====================
    /// The compressed texture stream could not be inflated.
    #[error("corrupt texture stream: {message}")]
    CorruptStream {
        /// Description of the failure.
        message: String,
    },

    /// The inflated texture exceeded the configured ceiling.
    #[error("inflated texture exceeds {limit} bytes")]
    InflatedTooLarge {
        /// Configured maximum.
        limit: usize,
    },

    /// The level table header holds impossible values.
    #[error("invalid level table: {level_count_minus_one} levels, smallest level {base_level_size} bytes")]
    InvalidLevelTable {
        /// Raw level count minus one.
        level_count_minus_one: i32,
        /// Raw size of the smallest level.
        base_level_size: i32,
    },

    /// The inflated stream ends before a level's declared bytes.
    #[error("level {level} at offset {offset} needs {expected} bytes, {available} available")]
    TruncatedLevelTable {
        /// Level index (0 = largest).
        level: usize,
        /// Offset of the level payload in the inflated stream.
        offset: usize,
        /// Declared level size.
        expected: usize,
        /// Bytes left in the stream.
        available: usize,
    },

    /// The texture pixel format tag is not supported.
    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    /// DDS parsing or block decoding failed.
    #[error("DDS error: {0}")]
    DdsError(String),

    /// Failed to encode PNG image.
    #[error("failed to encode PNG: {message}")]
    PngEncodeFailed {
        /// The encoding error message.
        message: String,
    },

    // ==================== XDB Errors ====================
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// XML attribute error.
    #[error("XML attribute error: {0}")]
    XmlAttrError(String),

    /// A required XDB field is missing.
    #[error("missing XDB field: {path}")]
    MissingXdbField {
        /// Slash-separated path of the field.
        path: String,
    },

    /// An XDB field holds a value that cannot be parsed.
    #[error("invalid XDB value at {path}: {value:?}")]
    InvalidXdbValue {
        /// Slash-separated path of the field.
        path: String,
        /// The raw text.
        value: String,
    },

    // ==================== Import Errors ====================
    /// The LOD selection matched nothing in the model.
    #[error("no LODs to be found in {path}; try another LOD selection")]
    NoLods {
        /// The model descriptor.
        path: PathBuf,
    },

    /// The model descriptor has no binary file reference.
    #[error("XDB has no binaryFile reference: {path}")]
    MissingBinaryFile {
        /// The model descriptor.
        path: PathBuf,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttrError(err.to_string())
    }
}

/// A specialized Result type for `AllodsBin` operations.
pub type Result<T> = std::result::Result<T, Error>;
