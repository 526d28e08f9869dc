//! Runtime record and state machine for one loaded mod.
//!
//! A [`ModInstance`] owns the mod's running object, its optional isolation
//! boundary ([`LoadContext`]) and the capability flags queried once from the
//! mod at construction. Hook faults propagate out of the instance untouched;
//! the loader decides how to report them. Capability violations (suspending a
//! mod that can't suspend) are benign no-ops here - the loader is the layer
//! that surfaces them as errors.

use serde::{ Deserialize, Serialize };
use thiserror::Error ;

use crate::config::ModConfig ;
use crate::interface::{ HookError, HookResult, LoaderApi, ModObject };
use crate::load_context::{ ContextError, LoadContext };

/// Externally visible execution state of a loaded mod.
#[derive( Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize )]
pub enum ModState {
	/// The mod is loaded and running.
	Running,
	/// The mod is loaded but its activity is paused.
	Suspended,
}

impl std::fmt::Display for ModState {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		match self {
			Self::Running => f.write_str( "running" ),
			Self::Suspended => f.write_str( "suspended" ),
		}
	}
}

/// Errors from tearing down a mod instance.
#[derive( Debug, Error )]
pub enum DisposeError {
	/// The mod's own unload hook failed. The isolation boundary is leaked
	/// rather than released, keeping the binary resident: code from it may
	/// still be reachable.
	#[error( "unload hook failed: {0}" )]
	UnloadHook( #[source] HookError ),
	/// The isolation boundary failed to reclaim the mod's binary.
	#[error( transparent )]
	Reclaim( #[from] ContextError ),
}

/// One loaded mod: its running object, isolation boundary and lifecycle state.
///
/// Instances for dynamically loaded binaries own a [`LoadContext`]; in-process
/// and data-only mods have none. The `can_suspend` / `can_unload` flags are
/// queried from the mod object exactly once, at construction.
#[derive( Debug )]
pub struct ModInstance {
	// Field order matters: the mod object borrows code from the context and
	// must drop first.
	mod_object: Option<ModObject>,
	context: Option<LoadContext>,
	config: ModConfig,
	state: ModState,
	can_suspend: bool,
	can_unload: bool,
	started: bool,
	disposed: bool,
}

impl ModInstance {

	/// Instance for a dynamically loaded binary, owning its isolation boundary.
	pub fn dynamic( context: LoadContext, mod_object: ModObject, config: ModConfig ) -> Self {
		let can_suspend = mod_object.can_suspend();
		let can_unload = mod_object.can_unload();
		Self {
			mod_object: Some( mod_object ),
			context: Some( context ),
			config,
			state: ModState::Running,
			can_suspend,
			can_unload,
			started: false,
			disposed: false,
		}
	}

	/// Instance for a mod living in the host binary itself (no boundary to reclaim).
	pub fn in_process( mod_object: ModObject, config: ModConfig ) -> Self {
		let can_suspend = mod_object.can_suspend();
		let can_unload = mod_object.can_unload();
		Self {
			mod_object: Some( mod_object ),
			context: None,
			config,
			state: ModState::Running,
			can_suspend,
			can_unload,
			started: false,
			disposed: false,
		}
	}

	/// Instance for a mod with no entry binary at all (data-only packages).
	pub fn data_only( config: ModConfig ) -> Self {
		Self {
			mod_object: None,
			context: None,
			config,
			state: ModState::Running,
			can_suspend: false,
			can_unload: true,
			started: false,
			disposed: false,
		}
	}

	/// The configuration this instance was loaded from.
	#[inline] pub fn config( &self ) -> &ModConfig { &self.config }

	/// This mod's id.
	#[inline] pub fn mod_id( &self ) -> &str { &self.config.mod_id }

	/// Current execution state.
	#[inline] pub fn state( &self ) -> ModState { self.state }

	/// Whether this mod supports suspend/resume. Fixed at construction.
	#[inline] pub fn can_suspend( &self ) -> bool { self.can_suspend }

	/// Whether this mod can be removed from the host process. Fixed at construction.
	#[inline] pub fn can_unload( &self ) -> bool { self.can_unload }

	/// Invokes the mod's start hook and transitions to Running.
	///
	/// Idempotent: a second call is a no-op, the hook runs at most once.
	pub fn start( &mut self, api: &LoaderApi ) -> HookResult {
		if self.started {
			return Ok(());
		}
		self.started = true ;
		if let Some( mod_object ) = self.mod_object.as_mut() {
			mod_object.start( api, &self.config )?;
		}
		self.state = ModState::Running ;
		Ok(())
	}

	/// Invokes the mod's suspend hook and transitions to Suspended.
	///
	/// A mod that declared it cannot suspend is left untouched - the hook is
	/// not invoked and the state does not change.
	pub fn suspend( &mut self ) -> HookResult {
		if self.can_suspend {
			if let Some( mod_object ) = self.mod_object.as_mut() {
				mod_object.suspend()?;
			}
			self.state = ModState::Suspended ;
		}
		Ok(())
	}

	/// Invokes the mod's resume hook and transitions back to Running.
	///
	/// No-op for mods that cannot suspend.
	pub fn resume( &mut self ) -> HookResult {
		if self.can_suspend {
			if let Some( mod_object ) = self.mod_object.as_mut() {
				mod_object.resume()?;
			}
			self.state = ModState::Running ;
		}
		Ok(())
	}

	/// Tears the mod down: disposing hook, unload hook, then boundary reclaim.
	///
	/// Only acts when the mod declared `can_unload`; otherwise it is a no-op
	/// and the mod stays resident. Idempotent: hooks run at most once even if
	/// called again. The reclaim blocks until the isolation boundary has
	/// released the binary; its failure is surfaced, never retried.
	pub fn dispose( &mut self ) -> Result<(), DisposeError> {
		if !self.can_unload || self.disposed {
			return Ok(());
		}
		self.disposed = true ;

		if let Some( mut mod_object ) = self.mod_object.take() {
			mod_object.disposing();
			if let Err( fault ) = mod_object.unload() {
				// The mod may have left code reachable; keep its binary resident.
				drop( mod_object );
				if let Some( context ) = self.context.take() {
					context.leak();
				}
				return Err( DisposeError::UnloadHook( fault ));
			}
		}

		if let Some( context ) = self.context.take() {
			context.close()?;
		}
		Ok(())
	}

}

impl Drop for ModInstance {
	fn drop( &mut self ) {
		if let Err( error ) = self.dispose() {
			tracing::warn!( mod_id = %self.config.mod_id, %error, "dispose failed during drop" );
		}
	}
}
