use mod_link::sort_mods ;

use crate::test_configs::config ;

#[test]
fn sorting_two_cycle_rejected() {

	let mods = vec![
		config( "a", &[ "b" ]),
		config( "b", &[ "a" ]),
	];

	let error = sort_mods( &mods ).unwrap_err();

	assert!( error.cycle.iter().any(| id | id == "a" ));
	assert!( error.cycle.iter().any(| id | id == "b" ));
	assert!( error.to_string().contains( "->" ), "error should spell out the cycle: {error}" );

}

#[test]
fn sorting_self_cycle_rejected() {

	let mods = vec![ config( "narcissus", &[ "narcissus" ]) ];

	let error = sort_mods( &mods ).unwrap_err();

	assert!( error.cycle.iter().all(| id | id == "narcissus" ));

}

#[test]
fn sorting_cycle_error_names_only_the_cycle() {

	let mods = vec![
		config( "innocent", &[] ),
		config( "a", &[ "b" ]),
		config( "b", &[ "a" ]),
	];

	let error = sort_mods( &mods ).unwrap_err();

	assert!( !error.cycle.iter().any(| id | id == "innocent" ));

}
