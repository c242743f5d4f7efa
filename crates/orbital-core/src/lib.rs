//! Event ingestion, load shedding, and marker lifecycle for the Orbital
//! telemetry globe.
//!
//! This crate is the policy layer between the event stream and the render
//! surface. It decides which events become visible entities, how long they
//! live, and how the system degrades under overload. Everything is owned by
//! a single [`OrbitalEngine`] that is driven by explicit `ingest` and `tick`
//! calls.
//!
//! # Modules
//!
//! - [`admission`] -- Soft/hard capacity limits with a probabilistic drop curve.
//! - [`clock`] -- Monotonic frame clock paired with the wall clock.
//! - [`config`] -- Configuration loading from `orbital-config.yaml`.
//! - [`diagnostics`] -- [`DiagnosticSink`] trait with tracing and recording sinks.
//! - [`engine`] -- The [`OrbitalEngine`] that wires every component together.
//! - [`indicator`] -- Periodic last-location indicator state machine.
//! - [`lifecycle`] -- Burst and persistent-dot entities, per-frame compaction.
//! - [`reconnect`] -- Terminal-failure reconnect scheduling for the transport.
//! - [`reporter`] -- Sliding-window rate, totals, and the recent-activity feed.
//! - [`runner`] -- Async frame driver fed by an inbound message channel.
//! - [`stream`] -- Payload decoding and clock-skew filtering.
//! - [`surface`] -- [`RenderSurface`] trait and the in-memory [`SceneSurface`].
//! - [`visibility`] -- Visibility gate and hidden-time accounting.
//!
//! [`OrbitalEngine`]: engine::OrbitalEngine
//! [`DiagnosticSink`]: diagnostics::DiagnosticSink
//! [`RenderSurface`]: surface::RenderSurface
//! [`SceneSurface`]: surface::SceneSurface

pub mod admission;
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod indicator;
pub mod lifecycle;
pub mod reconnect;
pub mod reporter;
pub mod runner;
pub mod stream;
pub mod surface;
pub mod visibility;
