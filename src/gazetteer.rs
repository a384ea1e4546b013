//! Static administrative gazetteer: state → district → local areas.
//!
//! Loaded once at startup, immutable afterwards. The district lists double
//! as the canonical membership check: a district selection is only ever one
//! of these entries, never free text.

use crate::normalize::normalize;

struct StateEntry {
    name: &'static str,
    districts: &'static [&'static str],
}

const STATES: &[StateEntry] = &[
    StateEntry {
        name: "Delhi",
        districts: &[
            "New Delhi", "Central Delhi", "South Delhi", "North Delhi",
            "East Delhi", "West Delhi", "Shahdara",
        ],
    },
    StateEntry {
        name: "Gujarat",
        districts: &["Ahmedabad", "Surat", "Vadodara", "Rajkot", "Bhavnagar"],
    },
    StateEntry {
        name: "Karnataka",
        districts: &[
            "Bengaluru Urban", "Bengaluru Rural", "Mysuru", "Dakshina Kannada",
            "Udupi", "Belagavi", "Ballari", "Tumakuru",
        ],
    },
    StateEntry {
        name: "Kerala",
        districts: &["Thiruvananthapuram", "Ernakulam", "Kozhikode", "Thrissur", "Kollam"],
    },
    StateEntry {
        name: "Maharashtra",
        districts: &[
            "Mumbai", "Mumbai Suburban", "Thane", "Pune", "Nagpur",
            "Nashik", "Aurangabad", "Solapur", "Kolhapur",
        ],
    },
    StateEntry {
        name: "Odisha",
        districts: &["Khordha", "Cuttack", "Ganjam", "Puri", "Sambalpur", "Balasore", "Mayurbhanj"],
    },
    StateEntry {
        name: "Puducherry",
        districts: &["Puducherry", "Karaikal", "Mahe", "Yanam"],
    },
    StateEntry {
        name: "Punjab",
        districts: &["Amritsar", "Ludhiana", "Jalandhar", "Patiala", "Bathinda"],
    },
    StateEntry {
        name: "Rajasthan",
        districts: &["Jaipur", "Jodhpur", "Udaipur", "Kota", "Ajmer"],
    },
    StateEntry {
        name: "Tamil Nadu",
        districts: &["Chennai", "Coimbatore", "Madurai", "Tiruchirappalli", "Salem"],
    },
    StateEntry {
        name: "Telangana",
        districts: &["Hyderabad", "Warangal", "Nizamabad", "Karimnagar"],
    },
    StateEntry {
        name: "Uttar Pradesh",
        districts: &[
            "Lucknow", "Kanpur Nagar", "Varanasi", "Agra", "Prayagraj",
            "Ghaziabad", "Gautam Buddha Nagar", "Meerut",
        ],
    },
    StateEntry {
        name: "West Bengal",
        districts: &["Kolkata", "Howrah", "Darjeeling", "North 24 Parganas", "Hooghly"],
    },
];

struct AreaEntry {
    state: &'static str,
    district: &'static str,
    areas: &'static [&'static str],
}

/// Known local areas per district. Ordered as curated; not exhaustive —
/// districts absent here simply contribute nothing to offline search.
const LOCAL_AREAS: &[AreaEntry] = &[
    AreaEntry { state: "Maharashtra", district: "Mumbai", areas: &["Andheri West", "Bandra East", "Dadar TT"] },
    AreaEntry { state: "Maharashtra", district: "Pune", areas: &["Kothrud", "Magarpatta", "Baner"] },
    AreaEntry { state: "Maharashtra", district: "Nagpur", areas: &["Dhantoli", "Sitabardi", "Mankapur"] },
    AreaEntry { state: "Odisha", district: "Khordha", areas: &["Saheed Nagar", "Patia", "Jaydev Vihar"] },
    AreaEntry { state: "Odisha", district: "Cuttack", areas: &["Bidanasi", "Tulsipur", "Jagatpur"] },
    AreaEntry { state: "Odisha", district: "Ganjam", areas: &["Brahmapur", "Chhatrapur", "Chatrapur Industrial"] },
    AreaEntry { state: "Uttar Pradesh", district: "Lucknow", areas: &["Gomti Nagar", "Aliganj", "Hazratganj"] },
    AreaEntry { state: "Uttar Pradesh", district: "Kanpur Nagar", areas: &["Swaroop Nagar", "Kakadeo", "Civil Lines"] },
    AreaEntry { state: "Uttar Pradesh", district: "Varanasi", areas: &["Godowlia", "Lahurabir", "Bhelupur"] },
    AreaEntry { state: "Karnataka", district: "Bengaluru Urban", areas: &["Koramangala", "Whitefield", "Hebbal"] },
    AreaEntry { state: "Karnataka", district: "Mysuru", areas: &["Vijayanagar", "Lakshmipuram", "Jayalakshmipuram"] },
    AreaEntry { state: "Karnataka", district: "Dakshina Kannada", areas: &["Hampankatta", "Surathkal", "Kadri"] },
    AreaEntry { state: "Delhi", district: "New Delhi", areas: &["Connaught Place", "Chanakyapuri", "Sarojini Nagar"] },
    AreaEntry { state: "Delhi", district: "Central Delhi", areas: &["Paharganj", "Kashmere Gate", "Daryaganj"] },
    AreaEntry { state: "Delhi", district: "South Delhi", areas: &["Saket", "Hauz Khas", "Vasant Kunj"] },
];

/// Read handle over the static dataset. Constructed once at engine start
/// and handed to whoever needs membership checks — no ambient globals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gazetteer;

impl Gazetteer {
    pub fn new() -> Self {
        Self
    }

    /// All known states, in display order.
    pub fn states(&self) -> Vec<&'static str> {
        STATES.iter().map(|s| s.name).collect()
    }

    /// Canonical spelling for a state name, matched through the normalizer.
    pub fn canonical_state(&self, name: &str) -> Option<&'static str> {
        let key = normalize(name);
        STATES.iter().find(|s| normalize(s.name) == key).map(|s| s.name)
    }

    /// Districts of a state, or empty for an unknown state.
    pub fn districts_for(&self, state: &str) -> &'static [&'static str] {
        let key = normalize(state);
        STATES
            .iter()
            .find(|s| normalize(s.name) == key)
            .map(|s| s.districts)
            .unwrap_or(&[])
    }

    /// Canonical spelling for a district within a state.
    pub fn canonical_district(&self, state: &str, district: &str) -> Option<&'static str> {
        let key = normalize(district);
        self.districts_for(state)
            .iter()
            .find(|d| normalize(d) == key)
            .copied()
    }

    pub fn contains_district(&self, state: &str, district: &str) -> bool {
        self.canonical_district(state, district).is_some()
    }

    /// Known local areas for a district, or empty when none are curated.
    pub fn areas_for(&self, state: &str, district: &str) -> &'static [&'static str] {
        let state_key = normalize(state);
        let district_key = normalize(district);
        LOCAL_AREAS
            .iter()
            .find(|e| normalize(e.state) == state_key && normalize(e.district) == district_key)
            .map(|e| e.areas)
            .unwrap_or(&[])
    }
}
