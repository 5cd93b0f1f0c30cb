//! Cross-guild chat relay core.
//!
//! Each participating guild registers one gateway channel. A message posted in
//! a gateway channel passes the moderation gate and is then fanned out to every
//! other registered gateway channel by the broadcast engine. The platform is
//! reached only through the [`GatewaySession`] trait, and audit events go to an
//! injected [`AuditSink`].

pub mod admin;
pub mod audit;
pub mod broadcast;
pub mod error;
pub mod format;
pub mod gate;
pub mod message;
pub mod registry;
pub mod service;
pub mod session;
pub mod store;
pub mod store_file;
pub mod store_memory;

pub use {
    admin::GatewayAdmin,
    audit::{AuditEvent, AuditLevel, AuditLog, AuditSink},
    broadcast::{BroadcastEngine, RelayResult},
    error::{Error, Result},
    gate::GateDecision,
    message::{
        Attachment, AttachmentRef, Author, GuildInfo, InboundMessage, MessageDeletion, MessageEdit,
        MessageRef, Origin, RelayMessage,
    },
    registry::{LogTarget, Registry, RegistryDocument},
    service::{DispatchOutcome, GlobalChat, IgnoreReason},
    session::{ChannelHandle, GatewaySession, MentionPolicy, Notice, OutboundMessage},
    store::RegistryStore,
    store_file::FileStore,
    store_memory::MemoryStore,
};
