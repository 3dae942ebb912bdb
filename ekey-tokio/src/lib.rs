//! Small tokio-adjacent building blocks shared by this workspace: a
//! named/logged task spawner, used by the usage-store eviction loop.

pub mod task;

pub use task::EkeyTask;
