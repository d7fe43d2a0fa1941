// src/domain/catalog.rs
//
// The static boat-feature schema. Field names are wire identifiers shared by
// the XML export, the XML feed import and the CSV import/template, so
// changing one here is a schema change for every downstream consumer.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Dimensions,
    Build,
    Galley,
    Engine,
    Navigation,
    Accommodation,
    SafetyEquipment,
    RigSails,
    Electronics,
    General,
    Equipment,
    Additional,
}

impl Category {
    pub fn wire_name(self) -> &'static str {
        match self {
            Category::Dimensions => "dimensions",
            Category::Build => "build",
            Category::Galley => "galley",
            Category::Engine => "engine",
            Category::Navigation => "navigation",
            Category::Accommodation => "accommodation",
            Category::SafetyEquipment => "safety_equipment",
            Category::RigSails => "rig_sails",
            Category::Electronics => "electronics",
            Category::General => "general",
            Category::Equipment => "equipment",
            Category::Additional => "additional",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        CATALOG
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.category)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug)]
pub struct FieldDef {
    pub name: &'static str,
    /// Companion column/field holding the unit ("loa" -> "loa_unit"); emitted
    /// as the item's `unit` attribute when present.
    pub unit_field: Option<&'static str>,
    /// Extra XML attributes sourced from companion fields named
    /// "{field}_{attr}" (rig/sails material and furling).
    pub attrs: &'static [&'static str],
}

const fn field(name: &'static str) -> FieldDef {
    FieldDef {
        name,
        unit_field: None,
        attrs: &[],
    }
}

const fn measured(name: &'static str, unit_field: &'static str) -> FieldDef {
    FieldDef {
        name,
        unit_field: Some(unit_field),
        attrs: &[],
    }
}

const fn sail(name: &'static str, attrs: &'static [&'static str]) -> FieldDef {
    FieldDef {
        name,
        unit_field: None,
        attrs,
    }
}

#[derive(Debug)]
pub struct CategoryDef {
    pub category: Category,
    pub name: &'static str,
    /// The engine block repeats as <other_engines><engine>...
    pub repeatable: bool,
    pub fields: &'static [FieldDef],
}

pub const CATALOG: &[CategoryDef] = &[
    CategoryDef {
        category: Category::Dimensions,
        name: "dimensions",
        repeatable: false,
        fields: &[
            measured("loa", "loa_unit"),
            measured("lwl", "lwl_unit"),
            measured("beam", "beam_unit"),
            measured("draft", "draft_unit"),
            measured("airdraft", "airdraft_unit"),
            measured("displacement", "displacement_unit"),
            measured("ballast", "ballast_unit"),
        ],
    },
    CategoryDef {
        category: Category::Build,
        name: "build",
        repeatable: false,
        fields: &[
            field("year"),
            field("builder"),
            field("designer"),
            field("where"),
            field("construction"),
            field("keel_type"),
            field("hull_colour"),
            field("deck_colour"),
            field("superstructure_colour"),
            field("hull_number"),
            field("ce_certificate"),
        ],
    },
    CategoryDef {
        category: Category::Galley,
        name: "galley",
        repeatable: false,
        fields: &[
            field("oven"),
            field("grill"),
            field("microwave"),
            field("hob"),
            field("fridge"),
            field("freezer"),
            field("sink"),
            field("water_heater"),
        ],
    },
    CategoryDef {
        category: Category::Engine,
        name: "engine",
        repeatable: true,
        fields: &[
            field("make"),
            field("model"),
            field("horse_power"),
            field("hours"),
            field("fuel"),
            field("drive"),
            field("cooling"),
            field("gearbox"),
            field("propeller_type"),
            field("starting_type"),
            measured("max_speed", "max_speed_unit"),
            measured("cruising_speed", "cruising_speed_unit"),
            measured("consumption", "consumption_unit"),
            measured("tankage", "tankage_unit"),
        ],
    },
    CategoryDef {
        category: Category::Navigation,
        name: "navigation",
        repeatable: false,
        fields: &[
            field("compass"),
            field("depth_instrument"),
            field("wind_instrument"),
            field("speed_instrument"),
            field("autopilot"),
            field("gps"),
            field("vhf"),
            field("radar"),
            field("chart_plotter"),
            field("navigation_lights"),
        ],
    },
    CategoryDef {
        category: Category::Accommodation,
        name: "accommodation",
        repeatable: false,
        fields: &[
            field("cabins"),
            field("berths"),
            field("toilet"),
            field("shower"),
            field("wash_basin"),
            field("heating"),
            field("air_conditioning"),
        ],
    },
    CategoryDef {
        category: Category::SafetyEquipment,
        name: "safety_equipment",
        repeatable: false,
        fields: &[
            field("life_raft"),
            field("epirb"),
            field("bilge_pump"),
            field("fire_extinguisher"),
            field("mob_system"),
            field("flares"),
            field("first_aid_kit"),
            field("radar_reflector"),
        ],
    },
    CategoryDef {
        category: Category::RigSails,
        name: "rig_sails",
        repeatable: false,
        fields: &[
            sail("genoa", &["material", "furling"]),
            sail("mainsail", &["material"]),
            sail("spinnaker", &["material"]),
            sail("storm_jib", &["material"]),
            sail("tri_sail", &["material"]),
            // winches carries no material attribute.
            field("winches"),
        ],
    },
    CategoryDef {
        category: Category::Electronics,
        name: "electronics",
        repeatable: false,
        fields: &[
            field("battery"),
            field("battery_charger"),
            field("generator"),
            field("inverter"),
            field("shore_power"),
            field("solar_panel"),
            field("television"),
            field("cd_player"),
        ],
    },
    CategoryDef {
        category: Category::General,
        name: "general",
        repeatable: false,
        fields: &[
            field("anchor"),
            field("bimini"),
            field("sprayhood"),
            field("dodgers"),
            field("fenders"),
            field("covers"),
            field("cockpit_cushions"),
            field("bathing_ladder"),
        ],
    },
    CategoryDef {
        category: Category::Equipment,
        name: "equipment",
        repeatable: false,
        fields: &[
            field("tender"),
            field("outboard"),
            field("davits"),
            field("windlass"),
            field("bow_thruster"),
            field("stern_thruster"),
        ],
    },
    CategoryDef {
        category: Category::Additional,
        name: "additional",
        repeatable: false,
        fields: &[
            // loa_m is synthesized on export from dimensions.loa; it is still
            // a real importable field.
            measured("loa_m", "loa_m_unit"),
            measured("range", "range_unit"),
            field("passenger_capacity"),
            field("last_serviced"),
        ],
    },
];

pub fn category_def(category: Category) -> &'static CategoryDef {
    CATALOG
        .iter()
        .find(|c| c.category == category)
        .expect("every Category variant has a CATALOG entry")
}

/// Flattened "category.field" headers for the CSV template and importer,
/// unit columns included.
pub fn flat_feature_headers() -> Vec<String> {
    let mut headers = Vec::new();
    for cat in CATALOG {
        for f in cat.fields {
            headers.push(format!("{}.{}", cat.name, f.name));
            if let Some(unit) = f.unit_field {
                headers.push(format!("{}.{}", cat.name, unit));
            }
            for attr in f.attrs {
                headers.push(format!("{}.{}_{}", cat.name, f.name, attr));
            }
        }
    }
    headers
}
