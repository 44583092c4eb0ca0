pub mod download;
pub mod folders;
pub mod search;
pub mod upload;

pub use download::Download;
pub use folders::Folders;
pub use search::Search;
pub use upload::Upload;
