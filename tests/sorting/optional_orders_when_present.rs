use mod_link::sort_mods ;

use crate::test_configs::{ config, config_with_optional, ids };

#[test]
fn sorting_optional_dependency_orders_when_present() {

	let mods = vec![
		config_with_optional( "plugin", &[], &[ "library" ]),
		config( "library", &[] ),
	];

	let sorted = sort_mods( &mods ).unwrap();

	assert_eq!( ids( &sorted ), [ "library", "plugin" ]);

}
