//! Transitive dependency resolution over mod configurations.
//!
//! Given a root config and the set of all known configs, [`get_dependencies`]
//! walks the declared dependency ids and classifies every reachable id into
//! exactly one of two buckets: resolved configurations or missing ids.
//! Missing dependencies are data, not errors - callers decide whether they
//! block loading.

use std::collections::{ BTreeSet, HashMap, HashSet };

use crate::config::ModConfig ;

/// The resolved transitive dependency closure of one or more mods.
///
/// Every id reachable by walking declared dependencies lands in exactly one
/// of the two sets. Configurations are unique by `mod_id` regardless of how
/// many mods depend on them; a config already visited is not re-walked, so
/// diamonds and cycles in the declared graph are safe here.
#[derive( Debug, Default, Clone )]
pub struct DependencySet {
	configurations: Vec<ModConfig>,
	missing: BTreeSet<String>,
}

impl DependencySet {

	/// The resolved dependency configurations, unique by id.
	///
	/// The order is a walk order, not a load order - pass these through
	/// [`sort_mods`]( crate::sort::sort_mods ) before loading.
	#[inline] pub fn configurations( &self ) -> &[ModConfig] { &self.configurations }

	/// Ids of mandatory dependencies with no matching known config.
	#[inline] pub fn missing( &self ) -> &BTreeSet<String> { &self.missing }

	/// True if a config with the given id was resolved into this set.
	pub fn contains( &self, mod_id: &str ) -> bool {
		self.configurations.iter().any(| config | config.mod_id == mod_id )
	}

	/// Unions another set into this one, keeping configurations unique by id.
	pub fn merge( &mut self, other: DependencySet ) {
		for config in other.configurations {
			if !self.contains( &config.mod_id ) {
				self.configurations.push( config );
			}
		}
		self.missing.extend( other.missing );
	}

}

/// One pending edge in the dependency walk. Optional edges resolve the same
/// way as mandatory ones but an absent target is skipped instead of reported.
struct Edge<'walk> {
	target_id: &'walk str,
	optional: bool,
}

/// Resolves the transitive dependency closure of `root`.
///
/// Ids that match a config in `all_known` are resolved and recursed into;
/// mandatory ids with no match are reported as missing and not recursed
/// further. The root itself is not part of the result.
pub fn get_dependencies( root: &ModConfig, all_known: &[ModConfig] ) -> DependencySet {

	let by_id: HashMap<&str, &ModConfig> = all_known.iter()
		.map(| config | ( config.mod_id.as_str(), config ))
		.collect();

	let mut set = DependencySet::default();
	let mut visited: HashSet<&str> = HashSet::new();
	visited.insert( root.mod_id.as_str() );

	let mut stack: Vec<Edge> = edges_of( root ).collect();
	while let Some( edge ) = stack.pop() {
		if visited.contains( edge.target_id ) {
			continue ;
		}
		match by_id.get( edge.target_id ) {
			Some( config ) => {
				visited.insert( edge.target_id );
				set.configurations.push(( *config ).clone() );
				stack.extend( edges_of( config ));
			}
			// An absent optional dependency is skipped, but deliberately not
			// marked visited: the same id may still be a mandatory dependency
			// of another mod on this walk, which must report it as missing.
			None if edge.optional => {}
			None => {
				visited.insert( edge.target_id );
				set.missing.insert( edge.target_id.to_string() );
			}
		}
	}

	set

}

/// Resolves and unions the dependency closures of several mods.
pub fn get_dependencies_all<'roots>(
	roots: impl IntoIterator<Item = &'roots ModConfig>,
	all_known: &[ModConfig],
) -> DependencySet {
	let mut set = DependencySet::default();
	for root in roots {
		set.merge( get_dependencies( root, all_known ));
	}
	set
}

fn edges_of( config: &ModConfig ) -> impl Iterator<Item = Edge<'_>> {
	let mandatory = config.mod_dependencies.iter()
		.map(| id | Edge { target_id: id, optional: false });
	let optional = config.optional_dependencies.iter()
		.map(| id | Edge { target_id: id, optional: true });
	mandatory.chain( optional )
}
