//! # Coverflow Core
//!
//! Headless engine for a virtualized, reorderable "3D carousel": a strip of
//! image tiles that curves away in perspective on both sides of a focused
//! item.
//!
//! ## Overview
//!
//! - **Selection animation**: a slightly overdamped spring drives the
//!   continuous focus toward the selected index
//! - **Image streaming**: a bounded LRU cache loads and decodes tile images
//!   on the tokio pool, with per-window cancellation
//! - **Virtualization**: only items within a radius of the focus stay
//!   resident; focus bursts are debounced
//! - **Projection & hit-testing**: one pure projection shared by drawing and
//!   pointer resolution
//! - **Drag-to-reorder**: long-press pick up, parting neighbors, edge
//!   auto-scroll and an animated drop
//!
//! ## Architecture
//!
//! - [`domains::carousel`]: the interaction side, orchestrated by
//!   [`domains::carousel::controller::CarouselController`]
//! - [`domains::images`]: decoded images, the decoder seam and the cache
//! - [`domains::render`]: the render side, fed only by
//!   [`domains::carousel::messages::RenderCommand`]s
//! - [`infra`]: constants, runtime overrides and timers
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! use coverflow_core::prelude::*;
//! use futures::FutureExt;
//!
//! struct Covers(Vec<String>);
//!
//! impl ItemSource for Covers {
//!     type Key = String;
//!
//!     fn len(&self) -> usize {
//!         self.0.len()
//!     }
//!
//!     fn image_key(&self, index: usize) -> Option<String> {
//!         self.0.get(index).cloned()
//!     }
//!
//!     fn payload(&self, index: usize) -> Option<PayloadFuture> {
//!         let path = self.0.get(index)?.clone();
//!         Some(
//!             async move {
//!                 std::fs::read(&path).map_err(|err| ImageError::Payload(err.to_string()))
//!             }
//!             .boxed(),
//!         )
//!     }
//!
//!     fn move_item(&mut self, from: usize, to: usize) {
//!         let item = self.0.remove(from);
//!         self.0.insert(to, item);
//!     }
//! }
//!
//! struct Canvas;
//!
//! impl RenderSurface for Canvas {
//!     fn draw_quad(&mut self, _: &ProjectedQuad, _: Option<&ImageHandle>, _: f32) {}
//!     fn request_next_frame(&mut self) {}
//!     fn release_image(&mut self, _: &ImageHandle) {}
//! }
//!
//! # async fn demo() {
//! let runtime = tokio::runtime::Handle::current();
//! let (scheduler, _timers) = TokioScheduler::new(runtime.clone());
//! let options = ControllerOptions {
//!     viewport: Size::new(1280.0, 720.0),
//!     ..ControllerOptions::default()
//! };
//! let (mut controller, commands) = CarouselController::new(
//!     Covers(vec!["a.png".into(), "b.png".into()]),
//!     options.clone(),
//!     Arc::new(RasterDecoder),
//!     Box::new(scheduler),
//!     runtime,
//! );
//! let render = RenderLoop::new(Canvas, commands, &options.config);
//! controller.set_focus(1, Instant::now());
//! # drop(render);
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Carousel, image and render domains
pub mod domains;

/// Error types
pub mod error;

/// Constants, runtime configuration and timers
pub mod infra;

pub mod prelude;

pub use error::{CarouselError, ImageError};
pub use infra::RuntimeConfig;
