//! A native mod loader runtime for building moddable applications.
//!
//! `mod_link` discovers mod packages on disk, resolves their declared
//! dependencies into a load order, loads them into the host process, and
//! drives their lifecycle (start, suspend, resume, unload). A small framed-TCP
//! RPC surface lets an external controller inspect and steer the loaded set.
//!
//! # Core Concepts
//!
//! - [`ModConfig`]: A mod package's parsed `mod.json` - identity, declared
//!   dependency ids, and per-bitness entry binary paths. Read from a mods
//!   directory with [`find_all_mods`].
//!
//! - [`DependencySet`]: The transitive dependency closure of one or more
//!   configs, produced by [`get_dependencies`]. Missing mandatory dependency
//!   ids are data in the set, not errors.
//!
//! - [`sort_mods`]: Deterministic topological load ordering. A dependency
//!   cycle is a hard [`CycleError`] naming the mods on the cycle.
//!
//! - [`ModV1`] / [`ModV2`]: The contract a mod implements. A dynamically
//!   loaded binary exports [`MOD_ENTRY_SYMBOL`] returning a [`ModObject`];
//!   capability answers (`can_suspend`, `can_unload`) are queried once and
//!   cached for the mod's lifetime.
//!
//! - [`ModInstance`]: One loaded mod - its running object, its isolation
//!   boundary ([`LoadContext`]) when dynamically loaded, and its
//!   [`ModState`].
//!
//! - [`Loader`]: Owns the loaded set for one target application. Batch
//!   loading resolves and sorts dependencies first, then loads in order,
//!   collecting per-mod faults instead of aborting the batch
//!   ([`PartialSuccess`]).
//!
//! - [`Host`] / [`Client`]: The RPC pair. Frames carry a type tag and a
//!   `u16` correlation key, so one client connection multiplexes concurrent
//!   requests; see [`protocol`] for the wire layout.
//!
//! # Example
//!
//! Mods normally live in dynamic libraries, but the [`ModSource`] seam lets a
//! host register mods compiled into its own binary:
//!
//! ```
//! use mod_link::{
//!     HookResult, Loader, LoaderApi, LoaderError, ModBinary, ModConfig,
//!     ModObject, ModSource, ModV1, PathTuple,
//! };
//! use tokio_util::sync::CancellationToken ;
//!
//! // A mod compiled into the host binary itself. Dynamically loaded mods
//! // export `mod_link_entry` from a cdylib instead.
//! struct Greeter ;
//!
//! impl ModV1 for Greeter {
//!     fn start( &mut self, api: &LoaderApi ) -> HookResult {
//!         println!( "hello from inside {}", api.application_name() );
//!         Ok(())
//!     }
//! }
//!
//! // The source seam decides how a config's binary enters the process.
//! struct InProcess ;
//!
//! impl ModSource for InProcess {
//!     fn acquire( &self, _entry: &PathTuple<ModConfig> ) -> Result<ModBinary, LoaderError> {
//!         Ok( ModBinary::InProcess( ModObject::V1( Box::new( Greeter ))))
//!     }
//! }
//!
//! let framework = ModConfig::with_id( "app.framework" );
//! let mut greeter = ModConfig::with_id( "app.greeter" );
//! greeter.mod_dependencies = vec![ "app.framework".to_string() ];
//!
//! let catalogue = vec![
//!     PathTuple::new( "mods/framework/mod.json", framework ),
//!     PathTuple::new( "mods/greeter/mod.json", greeter ),
//! ];
//!
//! let loader = Loader::new(
//!     LoaderApi::new( "example.app", "Example App" ),
//!     Box::new( InProcess ),
//!     catalogue,
//! );
//!
//! // Dependencies load first; faults in one mod never abort the batch.
//! let ( loaded, faults ) = loader
//!     .load_mods_with_dependencies( &[ "app.greeter" ], &CancellationToken::new() )
//!     .expect( "no missing dependencies" );
//!
//! assert!( faults.is_empty() );
//! assert_eq!( loaded, [ "app.framework", "app.greeter" ]);
//! ```
//!
//! # Remote Control
//!
//! [`Host::bind`] attaches a TCP listener to a shared [`Loader`]; a
//! [`Client`] connects, lists loaded mods with full config snapshots, and
//! drives mod state with [`Client::set_mod_state`]. Commands that fail on the
//! host come back as [`ClientError::Host`] carrying the host's error text.

mod client ;
mod config ;
mod dependency ;
mod discovery ;
mod instance ;
mod interface ;
mod load_context ;
mod loader ;
pub mod protocol ;
mod server ;
mod sort ;
mod utils ;

pub use client::{ Client, ClientError };
pub use config::{ ModConfig, PathTuple, CONFIG_FILE_NAME };
pub use dependency::{ get_dependencies, get_dependencies_all, DependencySet };
pub use discovery::{ find_all_mods, DiscoveryError, MAX_SEARCH_DEPTH };
pub use instance::{ DisposeError, ModInstance, ModState };
pub use interface::{
	HookError, HookResult, LoaderApi, ModEntry, ModObject, ModV1, ModV2, MOD_ENTRY_SYMBOL,
};
pub use load_context::{ ContextError, LoadContext };
pub use loader::{ DylibSource, Loader, LoaderError, ModBinary, ModSource };
pub use protocol::{ ModInfo, ModStateType, ServerModInfo };
pub use server::{ Dispatcher, Host, MessageMetadata, ServerError };
pub use sort::{ sort_mods, CycleError };
pub use utils::{ PartialResult, PartialSuccess };
