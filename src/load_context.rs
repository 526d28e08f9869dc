//! The isolation boundary a dynamically loaded mod lives inside.
//!
//! A [`LoadContext`] exclusively owns one loaded library handle. Dropping or
//! [`close`]( LoadContext::close )-ing the context is the single reclaim
//! point for everything loaded from that binary: after a successful close, no
//! executable code or data from the mod remains reachable in the host
//! process. Mods that are not dynamically loaded have no context at all.

use std::path::{ Path, PathBuf };

use thiserror::Error ;

use crate::interface::{ ModEntry, ModObject, MOD_ENTRY_SYMBOL };

/// Errors from opening, instantiating or reclaiming a mod binary.
#[derive( Debug, Error )]
pub enum ContextError {
	/// The OS loader could not open the binary.
	#[error( "failed to open mod binary {path}: {source}" )]
	OpenFailed { path: String, source: libloading::Error },
	/// The binary does not export the required entry symbol.
	#[error( "mod binary {path} does not export `{symbol}`" )]
	MissingEntryPoint { path: String, symbol: String },
	/// The entry function returned a null mod object.
	#[error( "mod binary {path} returned a null mod object" )]
	NullModObject { path: String },
	/// The OS loader failed to release the binary on close.
	#[error( "failed to reclaim mod binary {path}: {source}" )]
	CloseFailed { path: String, source: libloading::Error },
}

/// Owns the library handle of one dynamically loaded mod binary.
pub struct LoadContext {
	library: libloading::Library,
	path: PathBuf,
}

impl LoadContext {

	/// Loads the binary at `path` into the host process.
	///
	/// # Safety contract
	/// Loading a library runs its initialisers; the caller vouches that the
	/// binary is a mod built against this loader's entry contract.
	pub fn open( path: &Path ) -> Result<Self, ContextError> {
		// SAFETY: library initialisers run here; see the contract above.
		let library = unsafe { libloading::Library::new( path ) }
			.map_err(| source | ContextError::OpenFailed { path: path.display().to_string(), source })?;
		Ok( Self { library, path: path.to_path_buf() })
	}

	/// Calls the binary's entry function, producing its mod object.
	///
	/// The returned object borrows code from this context's library; it must
	/// be dropped before the context is closed.
	pub fn instantiate( &self ) -> Result<ModObject, ContextError> {
		// SAFETY: the symbol type is fixed by the mod entry contract.
		let entry = unsafe { self.library.get::<ModEntry>( MOD_ENTRY_SYMBOL ) }
			.map_err(| _ | ContextError::MissingEntryPoint {
				path: self.path.display().to_string(),
				symbol: String::from_utf8_lossy( MOD_ENTRY_SYMBOL ).to_string(),
			})?;
		// SAFETY: the entry transfers ownership of a `Box<ModObject>` as a raw pointer.
		let raw = unsafe { entry() };
		if raw.is_null() {
			return Err( ContextError::NullModObject { path: self.path.display().to_string() });
		}
		// SAFETY: non-null and allocated by `Box::into_raw` per the entry contract.
		Ok( *unsafe { Box::from_raw( raw ) })
	}

	/// Path of the binary this context loaded.
	#[inline] pub fn path( &self ) -> &Path { &self.path }

	/// Eagerly reclaims the library, blocking until the OS loader releases it.
	///
	/// This is the explicit reclaim point for the mod's code and resources.
	/// Failure is surfaced rather than retried: re-attempting a failed
	/// in-process unload has unclear safety.
	pub fn close( self ) -> Result<(), ContextError> {
		self.library.close()
			.map_err(| source | ContextError::CloseFailed { path: self.path.display().to_string(), source })
	}

	/// Deliberately leaves the library resident for the rest of the process.
	///
	/// Used when an unload hook has already failed: code from the binary may
	/// still be reachable, so releasing the handle would corrupt the host.
	pub fn leak( self ) {
		std::mem::forget( self.library );
	}

}

impl std::fmt::Debug for LoadContext {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "LoadContext" )
			.field( "path", &self.path )
			.finish()
	}
}
