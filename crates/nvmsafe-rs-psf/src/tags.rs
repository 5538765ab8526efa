// crates/nvmsafe-rs-psf/src/tags.rs
// Element and attribute names of the parameter-set file format.

pub const ROOT: &str = "parameter-set-file";
pub const FILE_VERSION: &str = "file-version";

pub const FILE_INFO: &str = "file-info";
pub const CREATION_TIME: &str = "creation-time";
pub const CREATOR: &str = "creator";
pub const TOOL_NAME: &str = "tool-name";
pub const TOOL_VERSION: &str = "tool-version";
pub const PROJECT_NAME: &str = "project-name";
pub const PROJECT_VERSION: &str = "project-version";
pub const USER_COMMENT: &str = "user-comment";

pub const DEVICES: &str = "devices";
pub const DEVICE: &str = "device";
pub const DATA_POOLS: &str = "data-pools";
pub const DATA_POOL: &str = "data-pool";
pub const LISTS: &str = "lists";
pub const LIST: &str = "list";
pub const ELEMENTS: &str = "elements";
pub const ELEMENT: &str = "element";
pub const VALUE: &str = "value";
pub const RAW: &str = "raw";

// Attributes
pub const INDEX: &str = "index";
pub const NAME: &str = "name";
pub const ENDIANNESS: &str = "endianness";
pub const START_ADDRESS: &str = "start-address";
pub const CRC: &str = "crc";
pub const TYPE: &str = "type";
pub const ARRAY_SIZE: &str = "array-size";
