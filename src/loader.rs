//! Orchestration of the loaded mod set for one target application.
//!
//! The [`Loader`] owns every [`ModInstance`] alive in the host process. All
//! state changes (load, unload, suspend, resume) serialize on an internal
//! mutator lock; queries take a read lock and hand out copied snapshots, never
//! references into the live set. Mod binaries are acquired through the
//! [`ModSource`] seam, so tests can inject in-process mods while production
//! use loads native dynamic libraries.

use std::collections::BTreeSet ;

use itertools::Itertools ;
use parking_lot::{ Mutex, RwLock };
use pipe_trait::Pipe ;
use thiserror::Error ;
use tokio_util::sync::CancellationToken ;

use crate::config::{ ModConfig, PathTuple };
use crate::dependency::get_dependencies_all ;
use crate::instance::{ DisposeError, ModInstance };
use crate::interface::{ HookError, LoaderApi, ModObject };
use crate::load_context::{ ContextError, LoadContext };
use crate::protocol::{ ModInfo, ModStateType, ServerModInfo };
use crate::sort::{ sort_mods, CycleError };
use crate::utils::PartialResult ;

/// Errors reported by loader operations.
///
/// One mod's fault never corrupts bookkeeping for the rest: batch loading
/// collects per-mod faults and keeps going, while single-mod operations
/// report exactly one of these.
#[derive( Debug, Error )]
pub enum LoaderError {
	/// A mandatory dependency id resolved to no known config.
	#[error( "missing dependencies: {}", .0.iter().join( ", " ))]
	MissingDependencies( BTreeSet<String> ),
	/// The dependency graph of the requested mods contains a cycle.
	#[error( transparent )]
	Cycle( #[from] CycleError ),
	/// The given id matches no config known to this loader.
	#[error( "mod {0} is not known to this loader" )]
	UnknownMod( String ),
	/// The given id matches no currently loaded mod.
	#[error( "mod {0} is not loaded" )]
	NotLoaded( String ),
	/// The mod is already loaded.
	#[error( "mod {0} is already loaded" )]
	AlreadyLoaded( String ),
	/// The mod declared at construction that it does not support this operation.
	#[error( "mod {mod_id} does not support {operation}" )]
	Unsupported { mod_id: String, operation: &'static str },
	/// A lifecycle hook of the mod itself failed.
	#[error( "mod {mod_id} failed in its {hook} hook: {source}" )]
	Hook { mod_id: String, hook: &'static str, source: HookError },
	/// Tearing the mod down failed; the mod is no longer tracked as loaded.
	#[error( "failed to unload mod {mod_id}: {source}" )]
	Dispose { mod_id: String, source: DisposeError },
	/// The mod's binary could not be opened or instantiated.
	#[error( transparent )]
	Context( #[from] ContextError ),
}

/// How a mod's binary enters the process.
pub enum ModBinary {
	/// A dynamically loaded binary together with its isolation boundary.
	Dynamic { context: LoadContext, mod_object: ModObject },
	/// A mod object living in the host binary itself (shared context, tests).
	InProcess( ModObject ),
	/// No binary at all; the mod is tracked for dependency purposes only.
	DataOnly,
}

/// Acquisition seam between the loader and mod binaries.
pub trait ModSource: Send + Sync {
	/// Produces the binary for one config, or reports why it could not.
	fn acquire( &self, entry: &PathTuple<ModConfig> ) -> Result<ModBinary, LoaderError>;
}

/// The production [`ModSource`]: native dynamic libraries.
///
/// The entry binary path comes from the config, resolved for the current
/// process bitness. A config that declares no entry, or whose entry binary is
/// absent on disk, loads as a data-only mod rather than failing.
pub struct DylibSource ;

impl ModSource for DylibSource {
	fn acquire( &self, entry: &PathTuple<ModConfig> ) -> Result<ModBinary, LoaderError> {
		let Some( path ) = entry.config.entry_path( &entry.path ) else {
			return Ok( ModBinary::DataOnly );
		};
		if !path.exists() {
			tracing::warn!(
				mod_id = %entry.config.mod_id,
				path = %path.display(),
				"entry binary not found, loading as data-only",
			);
			return Ok( ModBinary::DataOnly );
		}
		let context = LoadContext::open( &path )?;
		let mod_object = context.instantiate()?;
		Ok( ModBinary::Dynamic { context, mod_object })
	}
}

/// Owns and orchestrates the set of loaded mods for one target application.
pub struct Loader {
	api: LoaderApi,
	source: Box<dyn ModSource>,
	catalogue: Vec<PathTuple<ModConfig>>,
	mods: RwLock<Vec<ModInstance>>,
	// All state changes serialize here. Load and unload keep `mods` write
	// locks clear of mod hooks; suspend and resume hooks run under the write
	// lock and must return promptly.
	mutator: Mutex<()>,
}

impl Loader {

	/// Creates a loader over the given catalogue of known mod configs.
	pub fn new( api: LoaderApi, source: Box<dyn ModSource>, catalogue: Vec<PathTuple<ModConfig>> ) -> Self {
		Self {
			api,
			source,
			catalogue,
			mods: RwLock::new( Vec::new() ),
			mutator: Mutex::new(()),
		}
	}

	/// Creates a loader that loads mod binaries as native dynamic libraries.
	pub fn with_dylib_source( api: LoaderApi, catalogue: Vec<PathTuple<ModConfig>> ) -> Self {
		Self::new( api, Box::new( DylibSource ), catalogue )
	}

	/// The handle passed to every mod's start hook.
	#[inline] pub fn api( &self ) -> &LoaderApi { &self.api }

	/// All configs known to this loader, loaded or not.
	pub fn known_configs( &self ) -> Vec<ModConfig> {
		self.catalogue.iter().map(| entry | entry.config.clone() ).collect()
	}

	/// True if a mod with the given id is currently loaded.
	pub fn is_loaded( &self, mod_id: &str ) -> bool {
		self.mods.read().iter().any(| instance | instance.mod_id() == mod_id )
	}

	/// Ids of the currently loaded mods, in load order.
	pub fn loaded_ids( &self ) -> Vec<String> {
		self.mods.read().iter()
			.map(| instance | instance.mod_id().to_string() )
			.collect()
	}

	/// Loads `targets` and everything they transitively depend on.
	///
	/// The whole batch aborts before loading anything if a target is unknown,
	/// a mandatory dependency is missing, or the dependency graph is cyclic.
	/// Otherwise mods load and start in topological order; already-loaded ids
	/// are skipped. A mod whose acquisition or start hook fails is recorded as
	/// a fault and the batch continues with the rest. Cancellation is honored
	/// between mods, never mid-start.
	pub fn load_mods_with_dependencies(
		&self,
		targets: &[&str],
		cancel: &CancellationToken,
	) -> PartialResult<Vec<String>, LoaderError> {

		let _serialize = self.mutator.lock();

		let known = self.known_configs();
		let mut requested: Vec<ModConfig> = Vec::with_capacity( targets.len() );
		for target in targets {
			match known.iter().find(| config | config.mod_id == *target ) {
				Some( config ) => requested.push( config.clone() ),
				None => return Err(( LoaderError::UnknownMod(( *target ).to_string() ), Vec::new() )),
			}
		}

		let closure = get_dependencies_all( requested.iter(), &known );
		if !closure.missing().is_empty() {
			return Err(( LoaderError::MissingDependencies( closure.missing().clone() ), Vec::new() ));
		}

		let union: Vec<ModConfig> = closure.configurations().iter()
			.filter(| config | !requested.iter().any(| target | target.mod_id == config.mod_id ))
			.chain( requested.iter() )
			.cloned()
			.collect();
		let order = match union.pipe(| union | sort_mods( &union )) {
			Ok( order ) => order,
			Err( cycle ) => return Err(( cycle.into(), Vec::new() )),
		};

		let mut loaded = Vec::new();
		let mut faults = Vec::new();
		for config in &order {
			if cancel.is_cancelled() {
				tracing::info!( next = %config.mod_id, "batch load cancelled" );
				break ;
			}
			if self.is_loaded( &config.mod_id ) {
				continue ;
			}
			match self.load_one( &config.mod_id ) {
				Ok(()) => loaded.push( config.mod_id.clone() ),
				Err( fault ) => {
					tracing::warn!( mod_id = %config.mod_id, error = %fault, "mod failed to load" );
					faults.push( fault );
				}
			}
		}

		Ok(( loaded, faults ))

	}

	/// Loads a single mod (and its dependencies, if not yet loaded).
	pub fn load_mod( &self, mod_id: &str ) -> Result<(), LoaderError> {
		if self.is_loaded( mod_id ) {
			return Err( LoaderError::AlreadyLoaded( mod_id.to_string() ));
		}
		let ( _loaded, mut faults ) = self
			.load_mods_with_dependencies( &[mod_id], &CancellationToken::new() )
			.map_err(|( primary, _secondary )| primary )?;
		match faults.is_empty() {
			true => Ok(()),
			false => Err( faults.remove( 0 )),
		}
	}

	/// Unloads a mod, removing it from the loaded set and tearing it down.
	///
	/// The instance leaves the set before its hooks run, so other loader
	/// queries never observe a half-disposed mod.
	pub fn unload_mod( &self, mod_id: &str ) -> Result<(), LoaderError> {
		let _serialize = self.mutator.lock();

		let mut instance = {
			let mut mods = self.mods.write();
			let position = mods.iter()
				.position(| instance | instance.mod_id() == mod_id )
				.ok_or_else(|| LoaderError::NotLoaded( mod_id.to_string() ))?;
			if !mods[position].can_unload() {
				return Err( LoaderError::Unsupported {
					mod_id: mod_id.to_string(),
					operation: "unload",
				});
			}
			mods.remove( position )
		};

		// Hooks and boundary reclaim run outside the lock; they may block.
		instance.dispose().map_err(| source | LoaderError::Dispose {
			mod_id: mod_id.to_string(),
			source,
		})?;
		tracing::info!( mod_id, "mod unloaded" );
		Ok(())
	}

	/// Suspends a mod that declared suspend support.
	pub fn suspend_mod( &self, mod_id: &str ) -> Result<(), LoaderError> {
		self.with_suspendable( mod_id, "suspend", ModInstance::suspend )
	}

	/// Resumes a previously suspended mod.
	pub fn resume_mod( &self, mod_id: &str ) -> Result<(), LoaderError> {
		self.with_suspendable( mod_id, "resume", ModInstance::resume )
	}

	/// Applies a controller-requested state transition to a mod.
	pub fn set_mod_state( &self, mod_id: &str, state: ModStateType ) -> Result<(), LoaderError> {
		match state {
			ModStateType::Load => self.load_mod( mod_id ),
			ModStateType::Unload => self.unload_mod( mod_id ),
			ModStateType::Suspend => self.suspend_mod( mod_id ),
			ModStateType::Resume => self.resume_mod( mod_id ),
		}
	}

	/// Snapshot of the loaded mods for in-process consumers, in load order.
	pub fn get_loaded_mod_info( &self ) -> Vec<ModInfo> {
		self.mods.read().iter()
			.map(| instance | ModInfo {
				mod_id: instance.mod_id().to_string(),
				state: instance.state(),
				can_suspend: instance.can_suspend(),
				can_unload: instance.can_unload(),
			})
			.collect()
	}

	/// Snapshot of the loaded mods for RPC controllers, in load order.
	///
	/// Carries full config copies so controllers need no separate catalogue.
	pub fn server_mod_info( &self ) -> Vec<ServerModInfo> {
		self.mods.read().iter()
			.map(| instance | ServerModInfo {
				config: instance.config().clone(),
				state: instance.state(),
				can_suspend: instance.can_suspend(),
				can_unload: instance.can_unload(),
			})
			.collect()
	}

	/// Acquires, constructs and starts one mod. Caller holds the mutator lock.
	fn load_one( &self, mod_id: &str ) -> Result<(), LoaderError> {
		let entry = self.catalogue.iter()
			.find(| entry | entry.config.mod_id == mod_id )
			.ok_or_else(|| LoaderError::UnknownMod( mod_id.to_string() ))?;

		let mut instance = match self.source.acquire( entry )? {
			ModBinary::Dynamic { context, mod_object } =>
				ModInstance::dynamic( context, mod_object, entry.config.clone() ),
			ModBinary::InProcess( mod_object ) =>
				ModInstance::in_process( mod_object, entry.config.clone() ),
			ModBinary::DataOnly =>
				ModInstance::data_only( entry.config.clone() ),
		};

		instance.start( &self.api ).map_err(| source | LoaderError::Hook {
			mod_id: mod_id.to_string(),
			hook: "start",
			source,
		})?;

		self.mods.write().push( instance );
		tracing::info!( mod_id, "mod loaded" );
		Ok(())
	}

	/// Locates a loaded, suspend-capable mod and applies `action` to it.
	fn with_suspendable(
		&self,
		mod_id: &str,
		operation: &'static str,
		action: fn( &mut ModInstance ) -> Result<(), HookError>,
	) -> Result<(), LoaderError> {
		let _serialize = self.mutator.lock();
		let mut mods = self.mods.write();
		let instance = mods.iter_mut()
			.find(| instance | instance.mod_id() == mod_id )
			.ok_or_else(|| LoaderError::NotLoaded( mod_id.to_string() ))?;
		if !instance.can_suspend() {
			return Err( LoaderError::Unsupported {
				mod_id: mod_id.to_string(),
				operation,
			});
		}
		action( instance ).map_err(| source | LoaderError::Hook {
			mod_id: mod_id.to_string(),
			hook: operation,
			source,
		})?;
		tracing::debug!( mod_id, operation, "mod state changed" );
		Ok(())
	}

}

impl std::fmt::Debug for Loader {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "Loader" )
			.field( "application_id", &self.api.application_id() )
			.field( "known", &self.catalogue.len() )
			.field( "loaded", &self.mods.read().len() )
			.finish()
	}
}
