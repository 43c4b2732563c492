//! Grammar tables for the NTD description language
//!
//! A description is a sequence of sections, each a bracketed list of parenthesised elements:
//!
//! ```text
//! GRP=[(gid=g1,typ=lcl,thd=2)],
//! NRN=[(nid=in-1,grp=g1,thr=1.0mV,WDF=(fnc=exp,hlf=10ms),LOC=(cst=cl,rad=5um))],
//! CON=[(pre=in-1,pst=out-1,wgt=0.5,dly=1ms,lid=l1)],
//! LRN=[(lid=l1,fnc=stdph,inh=0.5,exc=1.0)]
//! ```
//!
//! Sections and nested function families may offer several element kinds sharing field names;
//! each kind then carries a [`Discriminator`] whose value tells the kinds apart. Changing the
//! language means editing these tables. The classifier builds its patterns from them.

use serde::Serialize;
use std::fmt;

/// Bumped whenever the tables below change shape or meaning.
pub const GRAMMAR_VERSION: &str = "1.0";

/// Top-level sections of a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SectionCode {
    #[serde(rename = "GRP")]
    Grp,
    #[serde(rename = "NRN")]
    Nrn,
    #[serde(rename = "CON")]
    Con,
    #[serde(rename = "LRN")]
    Lrn,
}

impl SectionCode {
    pub const ALL: [SectionCode; 4] = [Self::Grp, Self::Nrn, Self::Con, Self::Lrn];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grp => "GRP",
            Self::Nrn => "NRN",
            Self::Con => "CON",
            Self::Lrn => "LRN",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.as_str() == code)
    }
}

/// Function families nested inside neuron elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FamilyCode {
    #[serde(rename = "WDF")]
    Wdf,
    #[serde(rename = "SRP")]
    Srp,
    #[serde(rename = "WLF")]
    Wlf,
    #[serde(rename = "LOC")]
    Loc,
}

impl FamilyCode {
    pub const ALL: [FamilyCode; 4] = [Self::Wdf, Self::Srp, Self::Wlf, Self::Loc];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wdf => "WDF",
            Self::Srp => "SRP",
            Self::Wlf => "WLF",
            Self::Loc => "LOC",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.as_str() == code)
    }
}

/// Anything that holds elements: a section list or a nested function block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Container {
    Section(SectionCode),
    Function(FamilyCode),
}

impl Container {
    pub fn code(self) -> &'static str {
        match self {
            Self::Section(section) => section.as_str(),
            Self::Function(family) => family.as_str(),
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Identifies one element kind: its container plus a variant label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct KindId {
    pub container: Container,
    pub variant: &'static str,
}

impl KindId {
    pub const fn section(code: SectionCode, variant: &'static str) -> Self {
        Self {
            container: Container::Section(code),
            variant,
        }
    }

    pub const fn function(code: FamilyCode, variant: &'static str) -> Self {
        Self {
            container: Container::Function(code),
            variant,
        }
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.variant)
    }
}

/// One key of an element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Short human label, also used as placeholder filler.
    pub detail: &'static str,
    pub description: &'static str,
    pub default_value: Option<&'static str>,
    pub unit: Option<&'static str>,
    pub valid_values: &'static [&'static str],
}

impl FieldSpec {
    pub const fn new(name: &'static str, detail: &'static str, description: &'static str) -> Self {
        Self {
            name,
            detail,
            description,
            default_value: None,
            unit: None,
            valid_values: &[],
        }
    }

    pub const fn with_default(self, value: &'static str) -> Self {
        Self {
            default_value: Some(value),
            ..self
        }
    }

    pub const fn with_unit(self, unit: &'static str) -> Self {
        Self {
            unit: Some(unit),
            ..self
        }
    }

    pub const fn with_values(self, values: &'static [&'static str]) -> Self {
        Self {
            valid_values: values,
            ..self
        }
    }

    /// Append the unit, if any, to a value as it is written in a description.
    pub fn format_value(&self, value: &str) -> String {
        match self.unit {
            Some(unit) => format!("{value}{unit}"),
            None => value.to_string(),
        }
    }

    /// The default value with its unit.
    pub fn formatted_default(&self) -> Option<String> {
        self.default_value.map(|value| self.format_value(value))
    }
}

/// `key=value` pair that singles out one element kind among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Discriminator {
    pub key: &'static str,
    pub value: &'static str,
}

/// One concrete shape an element may take.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ElementKind {
    pub id: KindId,
    pub name: &'static str,
    pub description: &'static str,
    pub discriminator: Option<Discriminator>,
    pub fields: &'static [FieldSpec],
    /// Nested function blocks the element may carry, in template order.
    pub function_slots: &'static [FamilyCode],
}

impl ElementKind {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SectionSpec {
    pub code: SectionCode,
    pub name: &'static str,
    pub description: &'static str,
    pub kinds: &'static [ElementKind],
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FamilySpec {
    pub code: FamilyCode,
    pub name: &'static str,
    pub description: &'static str,
    pub kinds: &'static [ElementKind],
}

pub static SECTIONS: &[SectionSpec] = &[GROUPS, NEURONS, CONNECTIONS, LEARNING];

pub static FUNCTIONS: &[FamilySpec] = &[
    WEIGHT_DECAY,
    RELEASE_PROBABILITY,
    WEIGHT_LIMIT,
    LOCATION,
];

// Groups

const GROUPS: SectionSpec = SectionSpec {
    code: SectionCode::Grp,
    name: "groups",
    description: "Neuron groups. A group is simulated either by this process (local) or by a \
                  peer reached over the network (remote).",
    kinds: &[
        ElementKind {
            id: KindId::section(SectionCode::Grp, "lcl"),
            name: "local group",
            description: "Group simulated in-process.",
            discriminator: Some(Discriminator {
                key: "typ",
                value: "lcl",
            }),
            fields: &[
                FieldSpec::new(
                    "gid",
                    "group id",
                    "Identifier of the local group. Neurons join it through `grp`.",
                ),
                FieldSpec::new(
                    "typ",
                    "group type",
                    "Group type: local. The group's neurons run inside this simulator.",
                )
                .with_values(&["lcl"])
                .with_default("lcl"),
                FieldSpec::new(
                    "thd",
                    "worker threads",
                    "Number of worker threads stepping the group's neurons.",
                )
                .with_default("1"),
            ],
            function_slots: &[],
        },
        ElementKind {
            id: KindId::section(SectionCode::Grp, "rmt"),
            name: "remote group",
            description: "Group simulated by a remote peer.",
            discriminator: Some(Discriminator {
                key: "typ",
                value: "rmt",
            }),
            fields: &[
                FieldSpec::new(
                    "gid",
                    "group id",
                    "Identifier of the remote group. It must match the id the peer announces.",
                ),
                FieldSpec::new(
                    "typ",
                    "group type",
                    "Group type: remote. Spikes are exchanged with a peer simulator.",
                )
                .with_values(&["rmt"])
                .with_default("rmt"),
                FieldSpec::new("hst", "host", "Host name or address of the peer.")
                    .with_default("localhost"),
                FieldSpec::new("prt", "port", "TCP port the peer listens on.").with_default("9090"),
            ],
            function_slots: &[],
        },
    ],
};

// Neurons

const NEURONS: SectionSpec = SectionSpec {
    code: SectionCode::Nrn,
    name: "neurons",
    description: "Spiking neurons. Each neuron embeds its weight decay, release probability, \
                  weight limit and location functions.",
    kinds: &[ElementKind {
        id: KindId::section(SectionCode::Nrn, "neuron"),
        name: "neuron",
        description: "Leaky integrate-and-fire neuron.",
        discriminator: None,
        fields: &[
            FieldSpec::new("nid", "neuron id", "Unique identifier of the neuron."),
            FieldSpec::new(
                "grp",
                "group id",
                "Group the neuron belongs to; refers to a `gid` in the GRP section.",
            ),
            FieldSpec::new(
                "inh",
                "inhibitory",
                "Whether the neuron's outgoing spikes inhibit their targets.",
            )
            .with_values(&["true", "false"])
            .with_default("false"),
            FieldSpec::new(
                "thr",
                "spike threshold",
                "Membrane potential at which the neuron fires.",
            )
            .with_default("1.0")
            .with_unit("mV"),
            FieldSpec::new(
                "rst",
                "resting potential",
                "Membrane potential the neuron returns to after a spike.",
            )
            .with_default("0.0")
            .with_unit("mV"),
            FieldSpec::new(
                "rfp",
                "refractory period",
                "Time after a spike during which the neuron ignores input.",
            )
            .with_default("2")
            .with_unit("ms"),
        ],
        function_slots: &[
            FamilyCode::Wdf,
            FamilyCode::Srp,
            FamilyCode::Wlf,
            FamilyCode::Loc,
        ],
    }],
};

// Connections

const CONNECTIONS: SectionSpec = SectionSpec {
    code: SectionCode::Con,
    name: "connections",
    description: "Synaptic connections between neurons.",
    kinds: &[ElementKind {
        id: KindId::section(SectionCode::Con, "connection"),
        name: "connection",
        description: "Directed synapse from a presynaptic to a postsynaptic neuron.",
        discriminator: None,
        fields: &[
            FieldSpec::new("pre", "presynaptic neuron", "Id of the neuron sending spikes."),
            FieldSpec::new(
                "pst",
                "postsynaptic neuron",
                "Id of the neuron receiving spikes.",
            ),
            FieldSpec::new("wgt", "initial weight", "Synaptic weight at simulation start.")
                .with_default("0.5"),
            FieldSpec::new(
                "dly",
                "delay",
                "Transmission delay between the spike and its arrival.",
            )
            .with_default("1")
            .with_unit("ms"),
            FieldSpec::new(
                "lid",
                "learning function id",
                "Learning function applied to the weight; refers to a `lid` in the LRN section.",
            ),
        ],
        function_slots: &[],
    }],
};

// Learning functions

const LEARNING: SectionSpec = SectionSpec {
    code: SectionCode::Lrn,
    name: "learning functions",
    description: "Plasticity rules that connections refer to by id.",
    kinds: &[
        ElementKind {
            id: KindId::section(SectionCode::Lrn, "stdph"),
            name: "hebbian stdp",
            description: "Spike-timing dependent plasticity: pre-before-post strengthens.",
            discriminator: Some(Discriminator {
                key: "fnc",
                value: "stdph",
            }),
            fields: &[
                FieldSpec::new("lid", "learning function id", "Identifier of the learning function."),
                FieldSpec::new(
                    "fnc",
                    "learning function",
                    "Hebbian STDP. Causal spike pairs potentiate, acausal pairs depress.",
                )
                .with_values(&["stdph"])
                .with_default("stdph"),
                FieldSpec::new(
                    "inh",
                    "inhibition amplitude",
                    "Maximum depression applied to an acausal spike pair.",
                )
                .with_default("0.5"),
                FieldSpec::new(
                    "exc",
                    "excitation amplitude",
                    "Maximum potentiation applied to a causal spike pair.",
                )
                .with_default("1.0"),
                FieldSpec::new(
                    "ind",
                    "inhibition decay",
                    "Time constant of the depression window.",
                )
                .with_default("20")
                .with_unit("ms"),
                FieldSpec::new(
                    "exd",
                    "excitation decay",
                    "Time constant of the potentiation window.",
                )
                .with_default("20")
                .with_unit("ms"),
            ],
            function_slots: &[],
        },
        ElementKind {
            id: KindId::section(SectionCode::Lrn, "stdpa"),
            name: "anti-hebbian stdp",
            description: "Spike-timing dependent plasticity with inverted polarity.",
            discriminator: Some(Discriminator {
                key: "fnc",
                value: "stdpa",
            }),
            fields: &[
                FieldSpec::new("lid", "learning function id", "Identifier of the learning function."),
                FieldSpec::new(
                    "fnc",
                    "learning function",
                    "Anti-hebbian STDP. Causal spike pairs depress, acausal pairs potentiate.",
                )
                .with_values(&["stdpa"])
                .with_default("stdpa"),
                FieldSpec::new(
                    "inh",
                    "inhibition amplitude",
                    "Maximum depression applied to a causal spike pair.",
                )
                .with_default("0.5"),
                FieldSpec::new(
                    "exc",
                    "excitation amplitude",
                    "Maximum potentiation applied to an acausal spike pair.",
                )
                .with_default("1.0"),
                FieldSpec::new(
                    "ind",
                    "inhibition decay",
                    "Time constant of the depression window (causal side).",
                )
                .with_default("20")
                .with_unit("ms"),
                FieldSpec::new(
                    "exd",
                    "excitation decay",
                    "Time constant of the potentiation window (acausal side).",
                )
                .with_default("20")
                .with_unit("ms"),
            ],
            function_slots: &[],
        },
        ElementKind {
            id: KindId::section(SectionCode::Lrn, "flat"),
            name: "flat window",
            description: "Constant weight change for spike pairs inside a fixed window.",
            discriminator: Some(Discriminator {
                key: "fnc",
                value: "flat",
            }),
            fields: &[
                FieldSpec::new("lid", "learning function id", "Identifier of the learning function."),
                FieldSpec::new(
                    "fnc",
                    "learning function",
                    "Flat window. Every pair inside the window changes the weight by a fixed amount.",
                )
                .with_values(&["flat"])
                .with_default("flat"),
                FieldSpec::new(
                    "inh",
                    "inhibition amplitude",
                    "Weight decrease for acausal pairs inside the inhibition window.",
                )
                .with_default("0.5"),
                FieldSpec::new(
                    "exc",
                    "excitation amplitude",
                    "Weight increase for causal pairs inside the excitation window.",
                )
                .with_default("1.0"),
                FieldSpec::new(
                    "iwd",
                    "inhibition window",
                    "Width of the window in which acausal pairs depress.",
                )
                .with_default("20")
                .with_unit("ms"),
                FieldSpec::new(
                    "ewd",
                    "excitation window",
                    "Width of the window in which causal pairs potentiate.",
                )
                .with_default("20")
                .with_unit("ms"),
            ],
            function_slots: &[],
        },
        ElementKind {
            id: KindId::section(SectionCode::Lrn, "none"),
            name: "no learning",
            description: "Static weights.",
            discriminator: Some(Discriminator {
                key: "fnc",
                value: "none",
            }),
            fields: &[
                FieldSpec::new("lid", "learning function id", "Identifier of the learning function."),
                FieldSpec::new(
                    "fnc",
                    "learning function",
                    "No learning. Weights keep their initial value.",
                )
                .with_values(&["none"])
                .with_default("none"),
            ],
            function_slots: &[],
        },
    ],
};

// Weight decay

const WEIGHT_DECAY: FamilySpec = FamilySpec {
    code: FamilyCode::Wdf,
    name: "weight decay function",
    description: "How the weights of a neuron's incoming synapses decay towards zero over time.",
    kinds: &[
        ElementKind {
            id: KindId::function(FamilyCode::Wdf, "zer"),
            name: "zero decay",
            description: "Weights do not decay.",
            discriminator: Some(Discriminator {
                key: "fnc",
                value: "zer",
            }),
            fields: &[FieldSpec::new(
                "fnc",
                "decay function",
                "Zero decay. Weights keep their value between updates.",
            )
            .with_values(&["zer"])
            .with_default("zer")],
            function_slots: &[],
        },
        ElementKind {
            id: KindId::function(FamilyCode::Wdf, "exp"),
            name: "exponential decay",
            description: "Weights decay exponentially.",
            discriminator: Some(Discriminator {
                key: "fnc",
                value: "exp",
            }),
            fields: &[
                FieldSpec::new(
                    "fnc",
                    "decay function",
                    "Exponential decay. Weights halve every half-life.",
                )
                .with_values(&["exp"])
                .with_default("exp"),
                FieldSpec::new(
                    "hlf",
                    "half-life",
                    "Time after which an unreinforced weight has decayed to half its value.",
                )
                .with_default("10")
                .with_unit("ms"),
            ],
            function_slots: &[],
        },
        ElementKind {
            id: KindId::function(FamilyCode::Wdf, "lin"),
            name: "linear decay",
            description: "Weights decay by a constant amount per unit of time.",
            discriminator: Some(Discriminator {
                key: "fnc",
                value: "lin",
            }),
            fields: &[
                FieldSpec::new(
                    "fnc",
                    "decay function",
                    "Linear decay. Weights shrink by a fixed rate until they reach zero.",
                )
                .with_values(&["lin"])
                .with_default("lin"),
                FieldSpec::new("rte", "decay rate", "Weight lost per millisecond.")
                    .with_default("0.01")
                    .with_unit("1/ms"),
            ],
            function_slots: &[],
        },
    ],
};

// Release probability

const RELEASE_PROBABILITY: FamilySpec = FamilySpec {
    code: FamilyCode::Srp,
    name: "signal release probability",
    description: "Probability that a spike is actually transmitted to the neuron's targets.",
    kinds: &[
        ElementKind {
            id: KindId::function(FamilyCode::Srp, "fix"),
            name: "fixed probability",
            description: "Every spike is released with the same probability.",
            discriminator: Some(Discriminator {
                key: "fnc",
                value: "fix",
            }),
            fields: &[
                FieldSpec::new(
                    "fnc",
                    "release function",
                    "Fixed release. Each spike is released with probability `prb`.",
                )
                .with_values(&["fix"])
                .with_default("fix"),
                FieldSpec::new("prb", "release probability", "Probability in [0, 1] that a spike is released.")
                    .with_default("1.0"),
            ],
            function_slots: &[],
        },
        ElementKind {
            id: KindId::function(FamilyCode::Srp, "stc"),
            name: "stochastic probability",
            description: "The release probability is drawn per spike from a normal distribution.",
            discriminator: Some(Discriminator {
                key: "fnc",
                value: "stc",
            }),
            fields: &[
                FieldSpec::new(
                    "fnc",
                    "release function",
                    "Stochastic release. The probability is sampled for every spike.",
                )
                .with_values(&["stc"])
                .with_default("stc"),
                FieldSpec::new(
                    "prb",
                    "mean release probability",
                    "Mean of the distribution the release probability is drawn from.",
                )
                .with_default("0.5"),
                FieldSpec::new(
                    "dev",
                    "standard deviation",
                    "Standard deviation of the release probability distribution.",
                )
                .with_default("0.1"),
            ],
            function_slots: &[],
        },
    ],
};

// Weight limit

const WEIGHT_LIMIT: FamilySpec = FamilySpec {
    code: FamilyCode::Wlf,
    name: "weight limit function",
    description: "Bounds applied to the weights of a neuron's incoming synapses after learning.",
    kinds: &[
        ElementKind {
            id: KindId::function(FamilyCode::Wlf, "bnd"),
            name: "bounded weights",
            description: "Weights are clamped to a closed interval.",
            discriminator: Some(Discriminator {
                key: "fnc",
                value: "bnd",
            }),
            fields: &[
                FieldSpec::new(
                    "fnc",
                    "limit function",
                    "Bounded. Weights are clamped to [lwr, upr].",
                )
                .with_values(&["bnd"])
                .with_default("bnd"),
                FieldSpec::new("lwr", "lower bound", "Smallest weight a synapse may reach.")
                    .with_default("0.0"),
                FieldSpec::new("upr", "upper bound", "Largest weight a synapse may reach.")
                    .with_default("1.0"),
            ],
            function_slots: &[],
        },
        ElementKind {
            id: KindId::function(FamilyCode::Wlf, "unb"),
            name: "unbounded weights",
            description: "Weights are never clamped.",
            discriminator: Some(Discriminator {
                key: "fnc",
                value: "unb",
            }),
            fields: &[FieldSpec::new(
                "fnc",
                "limit function",
                "Unbounded. Learning may drive weights to any value.",
            )
            .with_values(&["unb"])
            .with_default("unb")],
            function_slots: &[],
        },
    ],
};

// Location

const LOCATION: FamilySpec = FamilySpec {
    code: FamilyCode::Loc,
    name: "location",
    description: "Position of the neuron in space, used for distance-dependent delays and \
                  visualisation.",
    kinds: &[
        ElementKind {
            id: KindId::function(FamilyCode::Loc, "ct"),
            name: "cartesian location",
            description: "Position given as x, y and z coordinates.",
            discriminator: Some(Discriminator {
                key: "cst",
                value: "ct",
            }),
            fields: &[
                FieldSpec::new(
                    "cst",
                    "coordinate system",
                    "Coordinate system: cartesian (x, y, z).",
                )
                .with_values(&["ct"])
                .with_default("ct"),
                FieldSpec::new("xco", "x coordinate", "Distance along the x axis.")
                    .with_default("0")
                    .with_unit("um"),
                FieldSpec::new("yco", "y coordinate", "Distance along the y axis.")
                    .with_default("0")
                    .with_unit("um"),
                FieldSpec::new("zco", "z coordinate", "Distance along the z axis.")
                    .with_default("0")
                    .with_unit("um"),
            ],
            function_slots: &[],
        },
        ElementKind {
            id: KindId::function(FamilyCode::Loc, "cl"),
            name: "cylindrical location",
            description: "Position given as radius, angle and height.",
            discriminator: Some(Discriminator {
                key: "cst",
                value: "cl",
            }),
            fields: &[
                FieldSpec::new(
                    "cst",
                    "coordinate system",
                    "Coordinate system: cylindrical (radius, angle, height).",
                )
                .with_values(&["cl"])
                .with_default("cl"),
                FieldSpec::new("rad", "radius", "Distance from the cylinder axis.")
                    .with_default("0")
                    .with_unit("um"),
                FieldSpec::new("ang", "angle", "Angle around the cylinder axis.")
                    .with_default("0")
                    .with_unit("deg"),
                FieldSpec::new("hgt", "height", "Distance along the cylinder axis.")
                    .with_default("0")
                    .with_unit("um"),
            ],
            function_slots: &[],
        },
        ElementKind {
            id: KindId::function(FamilyCode::Loc, "sp"),
            name: "spherical location",
            description: "Position given as radius, azimuth and polar angle.",
            discriminator: Some(Discriminator {
                key: "cst",
                value: "sp",
            }),
            fields: &[
                FieldSpec::new(
                    "cst",
                    "coordinate system",
                    "Coordinate system: spherical (radius, azimuth, polar angle).",
                )
                .with_values(&["sp"])
                .with_default("sp"),
                FieldSpec::new("rad", "radius", "Distance from the origin.")
                    .with_default("0")
                    .with_unit("um"),
                FieldSpec::new("azm", "azimuth", "Angle in the x-y plane from the x axis.")
                    .with_default("0")
                    .with_unit("deg"),
                FieldSpec::new("pol", "polar angle", "Angle from the z axis.")
                    .with_default("0")
                    .with_unit("deg"),
            ],
            function_slots: &[],
        },
    ],
};
