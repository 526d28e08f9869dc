use std::fs ;

use mod_link::{ find_all_mods, ModConfig };

#[test]
fn discovery_duplicate_id_keeps_first() {

	let mods_dir = tempfile::tempdir().unwrap();

	// Directory names sort `alpha` before `beta`, so `alpha`'s copy wins.
	for name in [ "alpha", "beta" ] {
		let directory = mods_dir.path().join( name );
		fs::create_dir_all( &directory ).unwrap();
		fs::write(
			directory.join( "mod.json" ),
			serde_json::to_string( &ModConfig::with_id( "pack.twin" )).unwrap(),
		).unwrap();
	}

	let ( configs, errors ) = find_all_mods( mods_dir.path() );

	assert!( errors.is_empty() );
	assert_eq!( configs.len(), 1 );
	assert!( configs[0].path.starts_with( mods_dir.path().join( "alpha" )));

}
