//! Deterministic load ordering of mod configurations.
//!
//! [`sort_mods`] performs a depth-first topological sort: every dependency of
//! a mod that is also present in the input appears strictly before it in the
//! output. Dependencies outside the input set are ignored - they are either
//! already loaded or irrelevant to this ordering.
//!
//! The graph lives in an index arena (marks and edge lists parallel to the
//! input slice) rather than a pointer-linked structure; the tri-state mark is
//! a plain enum on each slot.

use thiserror::Error ;

use crate::config::ModConfig ;

/// A dependency cycle between the given mods.
///
/// The ids are listed in walk order, ending with the mod that closed the
/// cycle. A cyclic set is rejected whole: silently breaking the cycle would
/// produce a load order that violates caller assumptions.
#[derive( Debug, Error )]
#[error( "dependency cycle detected: {}", .cycle.join( " -> " ))]
pub struct CycleError {
	/// Mod ids on the cycle, in walk order.
	pub cycle: Vec<String>,
}

/// Visit state of one arena slot during the depth-first sort.
#[derive( Debug, Copy, Clone, PartialEq, Eq )]
enum Mark {
	NotVisited,
	Visiting,
	Visited,
}

/// Orders `mods` so that every mod's dependencies load before it.
///
/// Both mandatory and optional dependencies order the output; ids not present
/// in the input are ignored. Independent mods keep their relative input order,
/// so the result is reproducible for a given input sequence.
///
/// # Errors
/// Returns [`CycleError`] if the dependency graph contains a cycle.
pub fn sort_mods( mods: &[ModConfig] ) -> Result<Vec<ModConfig>, CycleError> {

	// Index slots by input position; edges point at dependency slots.
	let index_of: std::collections::HashMap<&str, usize> = mods.iter()
		.enumerate()
		.map(|( index, config )| ( config.mod_id.as_str(), index ))
		.collect();

	let edges: Vec<Vec<usize>> = mods.iter()
		.map(| config | {
			config.mod_dependencies.iter()
				.chain( config.optional_dependencies.iter() )
				.filter_map(| id | index_of.get( id.as_str() ).copied() )
				.collect()
		})
		.collect();

	let mut marks = vec![ Mark::NotVisited; mods.len() ];
	let mut path = Vec::new();
	let mut sorted = Vec::with_capacity( mods.len() );

	for index in 0..mods.len() {
		if marks[index] == Mark::NotVisited {
			visit( index, mods, &edges, &mut marks, &mut path, &mut sorted )?;
		}
	}

	Ok( sorted.into_iter().map(| index | mods[index].clone() ).collect() )

}

/// Visits `index` depth-first, appending it after all its dependencies.
///
/// A slot encountered while itself marked `Visiting` closes a cycle; the
/// current walk path pinpoints which mods are on it.
fn visit(
	index: usize,
	mods: &[ModConfig],
	edges: &[Vec<usize>],
	marks: &mut [Mark],
	path: &mut Vec<usize>,
	sorted: &mut Vec<usize>,
) -> Result<(), CycleError> {

	match marks[index] {
		Mark::Visited => return Ok(()),
		Mark::Visiting => return Err( cycle_from_path( index, mods, path )),
		Mark::NotVisited => {}
	}

	marks[index] = Mark::Visiting ;
	path.push( index );

	for &dependency in &edges[index] {
		visit( dependency, mods, edges, marks, path, sorted )?;
	}

	path.pop();
	marks[index] = Mark::Visited ;
	sorted.push( index );

	Ok(())

}

fn cycle_from_path( repeated: usize, mods: &[ModConfig], path: &[usize] ) -> CycleError {
	let start = path.iter().position(| &index | index == repeated ).unwrap_or( 0 );
	let cycle = path[start..].iter()
		.chain( std::iter::once( &repeated ))
		.map(| &index | mods[index].mod_id.clone() )
		.collect();
	CycleError { cycle }
}
