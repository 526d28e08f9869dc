//! The contract between the loader and mod authors' code.
//!
//! A mod binary exposes a single entry function ([`MOD_ENTRY_SYMBOL`]) that
//! hands the loader a [`ModObject`]. The object's lifecycle hooks are invoked
//! by [`ModInstance`]( crate::instance::ModInstance ); its capability methods
//! are queried exactly once at construction and cached as flags, so a mod's
//! answers must not change over its lifetime.
//!
//! The interface is versioned as a small closed set: [`ModV1`] is the base
//! contract, [`ModV2`] additionally receives the mod's own configuration at
//! start. [`ModObject`] tags which version a mod implements so the loader
//! resolves the distinction once at load time instead of on every call.

use thiserror::Error ;

use crate::config::ModConfig ;

/// Symbol name a dynamically loaded mod binary must export.
///
/// The symbol has the [`ModEntry`] signature and transfers ownership of a
/// freshly allocated [`ModObject`] to the loader.
pub const MOD_ENTRY_SYMBOL: &[u8] = b"mod_link_entry" ;

/// Signature of the [`MOD_ENTRY_SYMBOL`] export.
///
/// The returned pointer must come from `Box::into_raw( Box::new( .. ))` in
/// the mod binary; the loader reclaims it with `Box::from_raw`.
pub type ModEntry = unsafe extern "C" fn() -> *mut ModObject ;

/// An error raised inside one of a mod's own lifecycle hooks.
///
/// Hook faults cross a binary boundary, so they are carried as plain text.
/// They propagate out of the mod instance unswallowed; the loader converts
/// them to reported errors at its orchestration boundary.
#[derive( Debug, Error )]
#[error( "{0}" )]
pub struct HookError( pub String );

impl From<String> for HookError {
	fn from( message: String ) -> Self { Self( message ) }
}
impl From<&str> for HookError {
	fn from( message: &str ) -> Self { Self( message.to_string() )}
}

/// Result of invoking one of a mod's lifecycle hooks.
pub type HookResult = Result<(), HookError>;

/// Version 1 of the mod contract.
///
/// Suspend/resume/unload default to supported-but-trivial; a mod that hooks
/// native code should override [`can_unload`]( Self::can_unload ) to return
/// `false` so the loader keeps it permanently resident.
pub trait ModV1: Send + Sync {
	/// Invoked once after the mod is loaded.
	fn start( &mut self, api: &LoaderApi ) -> HookResult ;

	/// Invoked when the loader suspends this mod. Only called if
	/// [`can_suspend`]( Self::can_suspend ) returned true.
	fn suspend( &mut self ) -> HookResult { Ok(()) }

	/// Invoked when the loader resumes this mod. Only called if
	/// [`can_suspend`]( Self::can_suspend ) returned true.
	fn resume( &mut self ) -> HookResult { Ok(()) }

	/// Invoked when the loader unloads this mod, after [`disposing`]( Self::disposing ).
	fn unload( &mut self ) -> HookResult { Ok(()) }

	/// Whether this mod supports the suspend/resume pair. Queried once.
	fn can_suspend( &self ) -> bool { false }

	/// Whether this mod can be safely removed from the host process. Queried once.
	fn can_unload( &self ) -> bool { true }

	/// Optional hook invoked just before unload, while the mod is still fully alive.
	fn disposing( &mut self ) {}
}

/// Version 2 of the mod contract: start receives the mod's own configuration.
pub trait ModV2: ModV1 {
	/// Invoked once after the mod is loaded, with the mod's parsed config.
	fn start_with_config( &mut self, api: &LoaderApi, config: &ModConfig ) -> HookResult ;
}

/// A running mod object, tagged with the interface version it implements.
///
/// The tag is resolved once when the binary's entry function runs; all later
/// lifecycle calls go through the forwarding methods below without
/// re-checking type identity.
pub enum ModObject {
	/// A mod implementing the base contract.
	V1( Box<dyn ModV1> ),
	/// A mod implementing the config-aware contract.
	V2( Box<dyn ModV2> ),
}

impl ModObject {

	pub(crate) fn start( &mut self, api: &LoaderApi, config: &ModConfig ) -> HookResult {
		match self {
			Self::V1( mod_object ) => mod_object.start( api ),
			Self::V2( mod_object ) => mod_object.start_with_config( api, config ),
		}
	}

	pub(crate) fn suspend( &mut self ) -> HookResult {
		match self {
			Self::V1( mod_object ) => mod_object.suspend(),
			Self::V2( mod_object ) => mod_object.suspend(),
		}
	}

	pub(crate) fn resume( &mut self ) -> HookResult {
		match self {
			Self::V1( mod_object ) => mod_object.resume(),
			Self::V2( mod_object ) => mod_object.resume(),
		}
	}

	pub(crate) fn unload( &mut self ) -> HookResult {
		match self {
			Self::V1( mod_object ) => mod_object.unload(),
			Self::V2( mod_object ) => mod_object.unload(),
		}
	}

	pub(crate) fn can_suspend( &self ) -> bool {
		match self {
			Self::V1( mod_object ) => mod_object.can_suspend(),
			Self::V2( mod_object ) => mod_object.can_suspend(),
		}
	}

	pub(crate) fn can_unload( &self ) -> bool {
		match self {
			Self::V1( mod_object ) => mod_object.can_unload(),
			Self::V2( mod_object ) => mod_object.can_unload(),
		}
	}

	pub(crate) fn disposing( &mut self ) {
		match self {
			Self::V1( mod_object ) => mod_object.disposing(),
			Self::V2( mod_object ) => mod_object.disposing(),
		}
	}

}

impl std::fmt::Debug for ModObject {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		match self {
			Self::V1( _ ) => f.write_str( "ModObject::V1" ),
			Self::V2( _ ) => f.write_str( "ModObject::V2" ),
		}
	}
}

/// The handle passed to every mod's start hook.
///
/// Identifies the target application the loader is running inside and the
/// loader's own version. Mods observe loader state through RPC or their own
/// configuration, never through a reference to the loader's internals.
#[derive( Debug, Clone )]
pub struct LoaderApi {
	application_id: String,
	application_name: String,
	loader_version: String,
}

impl LoaderApi {

	/// Creates the handle for a target application.
	pub fn new( application_id: impl Into<String>, application_name: impl Into<String> ) -> Self {
		Self {
			application_id: application_id.into(),
			application_name: application_name.into(),
			loader_version: env!( "CARGO_PKG_VERSION" ).to_string(),
		}
	}

	/// Id of the application the loader is running inside.
	#[inline] pub fn application_id( &self ) -> &str { &self.application_id }

	/// Display name of the application the loader is running inside.
	#[inline] pub fn application_name( &self ) -> &str { &self.application_name }

	/// The loader's own version string.
	#[inline] pub fn loader_version( &self ) -> &str { &self.loader_version }

}
