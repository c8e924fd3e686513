#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    StudyArea,
    Districts,        // Administrative reporting units
    Buildings,        // All buildings
    ResBuildings,     // Residential buildings only
    GreenSpace,       // Municipality-wide, never partitioned
    OpenSpace,
    PublicOpenSpace,
    PrivateOpenSpace,
    TreeCrowns,
}

impl LayerKind {
    pub fn to_str(&self) -> &'static str {
        match self {
            LayerKind::StudyArea => "study_area",
            LayerKind::Districts => "districts",
            LayerKind::Buildings => "bldg",
            LayerKind::ResBuildings => "res_bldg",
            LayerKind::GreenSpace => "green_space",
            LayerKind::OpenSpace => "open_space",
            LayerKind::PublicOpenSpace => "public_open_space",
            LayerKind::PrivateOpenSpace => "private_open_space",
            LayerKind::TreeCrowns => "tree_crowns",
        }
    }

    /// Every logical layer, in conversion order.
    pub fn all() -> [LayerKind; 9] {
        [
            LayerKind::StudyArea,
            LayerKind::Districts,
            LayerKind::Buildings,
            LayerKind::ResBuildings,
            LayerKind::GreenSpace,
            LayerKind::OpenSpace,
            LayerKind::PublicOpenSpace,
            LayerKind::PrivateOpenSpace,
            LayerKind::TreeCrowns,
        ]
    }

    /// Layers split into one extract per district by the partitioner.
    pub fn partitioned() -> [LayerKind; 4] {
        [
            LayerKind::Districts,
            LayerKind::Buildings,
            LayerKind::ResBuildings,
            LayerKind::TreeCrowns,
        ]
    }
}
