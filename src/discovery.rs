//! Filesystem discovery of mod packages.
//!
//! Walks a mods directory looking for [`CONFIG_FILE_NAME`] files a couple of
//! levels deep (mods live either directly under the directory or grouped one
//! folder deeper). Parsing is best-effort: a malformed config never aborts
//! discovery of the rest.

use std::path::Path ;

use thiserror::Error ;
use walkdir::WalkDir ;

use crate::config::{ ModConfig, PathTuple, CONFIG_FILE_NAME };
use crate::utils::PartialSuccess ;

/// Mods are found at most this many directory levels below the mods directory.
pub const MAX_SEARCH_DEPTH: usize = 3 ;

/// Errors produced while scanning a mods directory.
///
/// Discovery is partial-success: these are reported alongside the configs
/// that did parse, via [`find_all_mods`].
#[derive( Debug, Error )]
pub enum DiscoveryError {
	/// The config file could not be read.
	#[error( "failed to read {path}: {source}" )]
	Io { path: String, source: std::io::Error },
	/// The config file is not valid JSON or doesn't match the schema.
	#[error( "failed to parse {path}: {source}" )]
	Parse { path: String, source: serde_json::Error },
}

/// Finds and parses every mod configuration under `directory`.
///
/// Results are ordered by path so repeated scans of the same tree are
/// deterministic. If two configs declare the same `mod_id`, the first one
/// found wins and the duplicate is dropped.
pub fn find_all_mods( directory: &Path ) -> PartialSuccess<Vec<PathTuple<ModConfig>>, DiscoveryError> {

	let mut configs = Vec::new();
	let mut errors = Vec::new();
	let mut seen_ids = std::collections::HashSet::new();

	let walker = WalkDir::new( directory )
		.max_depth( MAX_SEARCH_DEPTH )
		.sort_by_file_name()
		.into_iter()
		.filter_map( Result::ok )
		.filter(| entry | entry.file_type().is_file() && entry.file_name() == CONFIG_FILE_NAME );

	for entry in walker {
		let path = entry.path();
		let text = match std::fs::read_to_string( path ) {
			Ok( text ) => text,
			Err( source ) => {
				errors.push( DiscoveryError::Io { path: path.display().to_string(), source });
				continue ;
			}
		};
		let config: ModConfig = match serde_json::from_str( &text ) {
			Ok( config ) => config,
			Err( source ) => {
				errors.push( DiscoveryError::Parse { path: path.display().to_string(), source });
				continue ;
			}
		};

		// Duplicate ids would make dependency resolution ambiguous.
		if seen_ids.insert( config.mod_id.clone() ) {
			configs.push( PathTuple::new( path, config ));
		} else {
			tracing::warn!( mod_id = %config.mod_id, path = %path.display(), "duplicate mod id, keeping first" );
		}
	}

	( configs, errors )

}
