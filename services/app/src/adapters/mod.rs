pub mod http;
pub mod session_file;
pub mod session_memory;

pub use http::ReqwestTransport;
pub use session_file::FileSessionStore;
pub use session_memory::MemorySessionStore;
