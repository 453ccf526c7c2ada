/// Region display name to the abbreviation used for its output file.
pub const REGIONS: [(&str, &str); 8] = [
    ("Banskobystrický", "BBSK"),
    ("Bratislavský", "BSK"),
    ("Nitriansky", "NSK"),
    ("Košický", "KSK"),
    ("Prešovský", "PSK"),
    ("Trenčiansky", "TSK"),
    ("Trnavský", "TTSK"),
    ("Žilinský", "ZSK"),
];

pub fn code_for(name: &str) -> Option<&'static str> {
    REGIONS
        .iter()
        .find(|(region, _)| *region == name)
        .map(|(_, code)| *code)
}

pub fn is_known(name: &str) -> bool {
    code_for(name).is_some()
}
