//! Sitemap engine: rendering backend, page agent and sitemap export.
mod agent;
mod backend;
mod decode;
mod engine;
mod export;
mod filename;
mod persist;
mod types;

pub use agent::{PageAgent, DEFAULT_MAX_LINKS};
pub use backend::{BackendSettings, HttpBackend, RenderBackend};
pub use decode::{decode_body, DecodedBody};
pub use engine::{BackendCommand, EngineCommander, EngineHandle};
pub use export::{ExportError, FileSink};
pub use filename::sitemap_filename;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{AgentMessage, AgentReport, BackendError, EngineEvent, HeaderOutcome, PageId};
