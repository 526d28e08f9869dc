//! Mod package configuration.
//!
//! Every mod package ships a [`CONFIG_FILE_NAME`] file next to its binaries
//! describing the mod's identity, its declared dependencies and where its
//! entry binaries live. The loader only ever works with parsed [`ModConfig`]
//! values; reading them from disk is handled by [`crate::discovery`].

use std::collections::HashMap ;
use std::path::{ Path, PathBuf };

use serde::{ Deserialize, Serialize };

/// File name of a mod's configuration, relative to the mod's directory.
pub const CONFIG_FILE_NAME: &str = "mod.json" ;

/// A parsed configuration paired with the path it was read from.
///
/// The path is needed to resolve the config's relative binary paths.
#[derive( Debug, Clone )]
pub struct PathTuple<T> {
	/// Full path to the configuration file on disk.
	pub path: PathBuf,
	/// The parsed configuration.
	pub config: T,
}

impl<T> PathTuple<T> {
	/// Pairs a configuration with the path it was read from.
	#[inline]
	pub fn new( path: impl Into<PathBuf>, config: T ) -> Self {
		Self { path: path.into(), config }
	}
}

/// Identity and metadata for a single mod package.
///
/// `mod_id` must be unique within the set of configs being resolved.
/// Dependency entries reference other configs by their `mod_id`; ids with no
/// matching config are reported as missing by the dependency resolver rather
/// than treated as errors here.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( default )]
pub struct ModConfig {
	/// Unique identifier, e.g. `"game.graphics.hd-textures"`.
	pub mod_id: String,
	/// Human readable display name.
	pub mod_name: String,
	/// Mod author, informational only.
	pub mod_author: String,
	/// Version string, informational only.
	pub mod_version: String,
	/// Free-form description shown by controllers.
	pub mod_description: String,
	/// Ids of mods that must be loaded before this one.
	pub mod_dependencies: Vec<String>,
	/// Ids of mods loaded before this one when present; silently skipped otherwise.
	pub optional_dependencies: Vec<String>,
	/// Library mods provide shared code only and are not independently toggled.
	pub is_library: bool,
	/// Path to the 32-bit entry binary, relative to the config file.
	pub entry_32: String,
	/// Path to the 64-bit entry binary, relative to the config file.
	pub entry_64: String,
	/// Search tags, informational only.
	pub tags: Vec<String>,
	/// Arbitrary data stored by other tooling, keyed by a unique string.
	pub plugin_data: HashMap<String, serde_json::Value>,
}

impl Default for ModConfig {
	fn default() -> Self {
		Self {
			mod_id: String::new(),
			mod_name: String::new(),
			mod_author: String::new(),
			mod_version: "1.0.0".to_string(),
			mod_description: String::new(),
			mod_dependencies: Vec::new(),
			optional_dependencies: Vec::new(),
			is_library: false,
			entry_32: String::new(),
			entry_64: String::new(),
			tags: Vec::new(),
			plugin_data: HashMap::new(),
		}
	}
}

impl ModConfig {

	/// Creates a minimal configuration with the given id and no dependencies.
	pub fn with_id( mod_id: impl Into<String> ) -> Self {
		let mod_id = mod_id.into();
		Self {
			mod_name: mod_id.clone(),
			mod_id,
			..Self::default()
		}
	}

	/// True if any entry binary path is set for this config.
	///
	/// Configs without an entry binary are data-only mods (texture packs,
	/// translation files); the loader tracks them without a mod object.
	pub fn has_entry( &self ) -> bool {
		!self.entry_32.is_empty() || !self.entry_64.is_empty()
	}

	/// Resolves the entry binary path for the current process bitness.
	///
	/// `config_path` is the full path to this config's [`CONFIG_FILE_NAME`]
	/// file; relative entries are resolved against its directory. Returns
	/// `None` if no entry is declared for this bitness.
	pub fn entry_path( &self, config_path: &Path ) -> Option<PathBuf> {
		let entry = match cfg!( target_pointer_width = "64" ) {
			true => &self.entry_64,
			false => &self.entry_32,
		};
		if entry.is_empty() {
			return None ;
		}
		let directory = config_path.parent().unwrap_or( Path::new( "" ));
		Some( directory.join( entry ))
	}

}

impl std::fmt::Display for ModConfig {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		write!( f, "{} ({})", self.mod_id, self.mod_version )
	}
}
