//! Built-in sample recipes for trying the calculator without a game-data import

use crate::provider::RecipeBook;

/// A handful of early-game Satisfactory recipes.
///
/// Iron Ingot has two producers on purpose: the plain smelter recipe comes
/// first, so it is the one the resolver picks. Plastic yields Heavy Oil Residue
/// as a byproduct.
pub fn sample_book() -> RecipeBook {
    let mut book = RecipeBook::new();

    let iron_ore = book.add_item("Iron Ore");
    let copper_ore = book.add_item("Copper Ore");
    let limestone = book.add_item("Limestone");
    let crude_oil = book.add_item("Crude Oil");
    let water = book.add_item("Water");
    let iron_ingot = book.add_item("Iron Ingot");
    let copper_ingot = book.add_item("Copper Ingot");
    let iron_plate = book.add_item("Iron Plate");
    let iron_rod = book.add_item("Iron Rod");
    let screw = book.add_item("Screw");
    let wire = book.add_item("Wire");
    let cable = book.add_item("Cable");
    let concrete = book.add_item("Concrete");
    let reinforced_plate = book.add_item("Reinforced Iron Plate");
    let plastic = book.add_item("Plastic");
    let residue = book.add_item("Heavy Oil Residue");

    let smelter = book.add_building("Smelter");
    let constructor = book.add_building("Constructor");
    let assembler = book.add_building("Assembler");
    let refinery = book.add_building("Refinery");

    book.add_recipe("Iron Ingot", 2.0, smelter, &[(iron_ore, 1)], &[(iron_ingot, 1)]);
    book.add_recipe("Copper Ingot", 2.0, smelter, &[(copper_ore, 1)], &[(copper_ingot, 1)]);
    book.add_recipe("Iron Plate", 6.0, constructor, &[(iron_ingot, 3)], &[(iron_plate, 2)]);
    book.add_recipe("Iron Rod", 4.0, constructor, &[(iron_ingot, 1)], &[(iron_rod, 1)]);
    book.add_recipe("Screw", 6.0, constructor, &[(iron_rod, 1)], &[(screw, 4)]);
    book.add_recipe("Wire", 4.0, constructor, &[(copper_ingot, 1)], &[(wire, 2)]);
    book.add_recipe("Cable", 2.0, constructor, &[(wire, 2)], &[(cable, 1)]);
    book.add_recipe("Concrete", 4.0, constructor, &[(limestone, 3)], &[(concrete, 1)]);
    book.add_recipe(
        "Reinforced Iron Plate",
        12.0,
        assembler,
        &[(iron_plate, 6), (screw, 12)],
        &[(reinforced_plate, 1)],
    );
    book.add_recipe(
        "Plastic",
        6.0,
        refinery,
        &[(crude_oil, 3)],
        &[(plastic, 2), (residue, 1)],
    );
    book.add_recipe(
        "Alternate: Pure Iron Ingot",
        12.0,
        refinery,
        &[(iron_ore, 7), (water, 4)],
        &[(iron_ingot, 13)],
    );

    book
}
