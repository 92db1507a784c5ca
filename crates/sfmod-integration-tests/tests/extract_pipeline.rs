//! End-to-end extraction over an in-memory asset set: a base game and one
//! mod, extracted twice the way the tool is used in practice. The first run
//! produces the base-game baseline; the second is disambiguated against it.

use serde_json::json;
use sfmod_core::builder::BUILD_GUN_REFS;
use sfmod_core::extractor::{ExtractOptions, Extractor};
use sfmod_core::game_data::GameData;
use sfmod_core::project::ModOutput;
use sfmod_core::test_utils::*;

const MOD: &str = "PowerPlus";

fn ore() -> String {
    format!("{GAME}/Resource/RawResources/OreIron/Desc_OreIron")
}

fn ingot() -> String {
    format!("{GAME}/Resource/Parts/IronIngot/Desc_IronIngot")
}

fn smelter() -> String {
    format!("{GAME}/Buildable/Factory/SmelterMk1/Build_SmelterMk1")
}

fn in_mod(path: &str) -> String {
    format!("{}/{path}", mod_root(MOD))
}

fn base_game(fixture: &mut Fixture) {
    let recipe = format!("{GAME}/Recipes/Smelter/Recipe_IngotIron");
    fixture
        .item_with_icon(&ore(), "Iron Ore", &format!("{GAME}/Resource/UI/IconDesc_OreIron_64"))
        .item_with_icon(&ingot(), "Iron Ingot", &format!("{GAME}/Resource/UI/IconDesc_IronIngot_64"))
        .buildable(
            &smelter(),
            "Smelter",
            json!({"mPowerConsumption": 4, "mPowerConsumptionExponent": 1.321929}),
        )
        .recipe(&recipe, Some("Iron Ingot"), &[&soft_ref(&smelter())], &[(&ore(), 1)], &[(&ingot(), 1)], 2.0)
        .schematic(&format!("{GAME}/Schematics/Progression/Schematic_0-2"), 0, 2.0, &[&recipe])
        .sink_table(
            &format!("{GAME}/Buildable/Factory/ResourceSink/DT_ResourceSinkPoints"),
            &[(&ore(), 1), (&ingot(), 2)],
        );
}

fn power_mod(fixture: &mut Fixture) {
    let fuel = in_mod("Parts/Desc_FuelRod");
    let generator = in_mod("Buildable/Build_FuelGenerator");
    let descriptor = in_mod("Buildable/Desc_FuelGenerator");
    let build_recipe = in_mod("Recipes/Recipe_FuelGenerator");
    let fuel_recipe = in_mod("Recipes/Recipe_FuelRod");
    let ingot_recipe = in_mod("Recipes/Recipe_BetterIngot");
    let schematic = in_mod("Schematics/Schematic_Power");
    let sinks = in_mod("DT_PowerPlusSink");

    fixture
        .item_with_icon(&fuel, "Fuel Rod", &in_mod("UI/IconDesc_FuelRod"))
        .blueprint(
            &generator,
            "FGBuildableGeneratorFuel",
            json!({
                "mDisplayName": localized("Fuel Generator"),
                "mBasePowerProduction": 150,
                "mDefaultFuelClasses": [class_ref(&fuel)],
            }),
        )
        .machine_descriptor(&descriptor, "Fuel Generator", &generator, Some(&in_mod("UI/IconDesc_FuelGenerator")))
        .recipe(&build_recipe, Some("Fuel Generator"), &[BUILD_GUN_REFS[0]], &[(&ingot(), 10)], &[(&descriptor, 1)], 1.0)
        .recipe(&fuel_recipe, Some("Fuel Rod"), &[&soft_ref(&smelter())], &[(&ingot(), 2)], &[(&fuel, 1)], 8.0)
        .recipe(&ingot_recipe, Some("Iron Ingot"), &[&soft_ref(&smelter())], &[(&ore(), 3)], &[(&ingot(), 2)], 4.0)
        .schematic(&schematic, 2, 1.0, &[&build_recipe, &fuel_recipe, &ingot_recipe])
        .sink_table(&sinks, &[(&fuel, 250)])
        .world_module(&in_mod("RootGame_PowerPlus"), &[&schematic], &[], Some(&sinks))
        .resource_node(&in_mod("Nodes/BP_DeepIronNode"), &ore(), Some(2.0));
}

fn extract(baseline: &GameData) -> Vec<ModOutput> {
    let mut fixture = Fixture::new();
    base_game(&mut fixture);
    power_mod(&mut fixture);
    let mut extractor = Extractor::new(fixture.boxed(), ExtractOptions::default());
    let report = extractor.run().unwrap();
    assert_eq!(report.skipped, 0);
    extractor.project(baseline)
}

fn output<'a>(outputs: &'a [ModOutput], mod_name: &str) -> &'a ModOutput {
    outputs.iter().find(|o| o.mod_name == mod_name).unwrap()
}

#[test]
fn first_run_produces_the_base_game() {
    let outputs = extract(&GameData::new());
    let base = output(&outputs, "FactoryGame");

    assert!(base.data.parts.contains_name("Iron Ore"));
    assert!(base.data.parts.contains_name("Iron Ingot"));
    let ingot = base.data.parts.iter().find(|p| p.name == "Iron Ingot").unwrap();
    assert_eq!(ingot.sink_points, Some(2));
    assert_eq!(ingot.tier, "0-2");

    let smelter = base.data.machines.iter().find(|m| m.name == "Smelter").unwrap();
    assert_eq!(smelter.average_power.as_deref(), Some("4"));
    assert_eq!(base.data.recipes.len(), 1);
}

#[test]
fn second_run_is_disambiguated_against_the_baseline() {
    let baseline = output(&extract(&GameData::new()), "FactoryGame").data.clone();
    let outputs = extract(&baseline);

    assert!(output(&outputs, "FactoryGame").data.is_empty());

    let power = output(&outputs, MOD);
    let recipes: Vec<(&str, &str)> = power
        .data
        .recipes
        .iter()
        .map(|r| (r.name.as_str(), r.machine.as_str()))
        .collect();
    assert!(recipes.contains(&("Fuel Rod", "Smelter")));
    assert!(recipes.contains(&("Iron Ingot (Alt 1)", "Smelter")));
    assert!(recipes.contains(&("Iron Ore", "Miner")));
    // Build recipes are not production recipes.
    assert!(!recipes.iter().any(|(name, _)| *name == "Fuel Generator"));

    // Base parts already in the baseline are not carried.
    assert!(!power.data.parts.contains_name("Iron Ingot"));
    let fuel = power.data.parts.iter().find(|p| p.name == "Fuel Rod").unwrap();
    assert_eq!(fuel.sink_points, Some(250));
    assert_eq!(fuel.tier, "2-1");
}

#[test]
fn mod_machines_take_cost_and_icon_from_their_build_recipe() {
    let outputs = extract(&GameData::new());
    let power = output(&outputs, MOD);

    let generator = power.data.machines.iter().find(|m| m.name == "Fuel Generator").unwrap();
    assert_eq!(generator.base_power.as_deref(), Some("150"));
    let cost = generator.cost.as_ref().unwrap();
    assert_eq!(cost.len(), 1);
    assert_eq!(cost[0].part, "Iron Ingot");
    assert_eq!(cost[0].amount, "10");

    let icons: Vec<&str> = power.icons.iter().map(|i| i.name.as_str()).collect();
    assert!(icons.contains(&"Fuel Generator"));
    assert!(icons.contains(&"Fuel Rod"));
}

#[test]
fn resource_nodes_scale_with_their_multiplier() {
    let outputs = extract(&GameData::new());
    let miner = output(&outputs, MOD)
        .data
        .recipes
        .iter()
        .find(|r| r.machine == "Miner")
        .unwrap()
        .clone();
    assert_eq!(miner.batch_time.as_deref(), Some("60"));
    assert_eq!(miner.tier, "0-0");
    assert_eq!(miner.parts.len(), 1);
    assert_eq!(miner.parts[0].amount, "2");
}
