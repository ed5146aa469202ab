//! Purpose: Static catalogue of known module identifiers and artifact names.
//! Exports: `ModuleDescriptor`, `ModuleRegistry`, `NO_ARTIFACT`.
//! Role: Pure read-only lookup; file probing belongs to the resolver.
//! Invariants: Catalogue order is trial order; duplicates are ordered fallbacks.
//! Invariants: Identifier comparison is case-insensitive exact match.

use crate::core::platform::Os;

/// Sentinel used in the raw catalogue for "no artifact on this platform".
pub const NO_ARTIFACT: &str = "none";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ModuleDescriptor {
    pub identifier: &'static str,
    pub linux_artifact: Option<&'static str>,
    pub windows_artifact: Option<&'static str>,
    pub description: &'static str,
}

impl ModuleDescriptor {
    fn from_row(row: &CatalogueRow) -> Self {
        let (identifier, linux, windows, description) = *row;
        Self {
            identifier,
            linux_artifact: artifact_name(linux),
            windows_artifact: artifact_name(windows),
            description,
        }
    }

    pub fn artifact_for(&self, os: Os) -> Option<&'static str> {
        match os {
            Os::Linux => self.linux_artifact,
            Os::Windows => self.windows_artifact,
        }
    }
}

fn artifact_name(raw: &'static str) -> Option<&'static str> {
    if raw == NO_ARTIFACT { None } else { Some(raw) }
}

type CatalogueRow = (&'static str, &'static str, &'static str, &'static str);

// Identifier / linux artifact / windows artifact / description.
// Entries sharing an identifier are tried in this order.
const CATALOGUE: &[CatalogueRow] = &[
    ("action", "ahl_i386.so", "ahl.dll", "Action Half-Life"),
    ("ag", "ag_i386.so", "ag.dll", "Adrenaline Gamer Steam"),
    ("ag3", "hl_i386.so", "hl.dll", "Adrenalinegamer 3.x"),
    ("aghl", "ag_i386.so", "ag.dll", "Adrenalinegamer 4.x"),
    ("arg", "arg_i386.so", "hl.dll", "Arg!"),
    ("asheep", "hl_i386.so", "hl.dll", "Azure Sheep"),
    ("hcfrenzy", "hcfrenzy.so", "hcfrenzy.dll", "Headcrab Frenzy"),
    ("bdef", "../cl_dlls/server.so", "../cl_dlls/server.dll", "Base Defense [Modification]"),
    ("bdef", "server.so", "server.dll", "Base Defense [Steam Version]"),
    ("bg", "bg_i386.so", "bg.dll", "The Battle Grounds"),
    ("bhl", "none", "bhl.dll", "Brutal Half-Life"),
    ("bot", "bot_i386.so", "bot.dll", "Bot"),
    ("brainbread", "bb_i386.so", "bb.dll", "BrainBread"),
    ("bshift", "bshift.so", "hl.dll", "Half-Life: Blue Shift"),
    ("bumpercars", "hl_i386.so", "hl.dll", "Bumper Cars"),
    ("buzzybots", "bb_i386.so", "bb.dll", "BuzzyBots"),
    ("ckf3", "none", "mp.dll", "Chicken Fortress 3"),
    ("cs10", "none", "mp.dll", "Counter-Strike 1.0"),
    ("cs13", "cs_i386.so", "mp.dll", "Counter-Strike 1.3"),
    ("cstrike", "cs.so", "mp.dll", "Counter-Strike"),
    ("csv15", "cs_i386.so", "mp.dll", "CS 1.5 for Steam"),
    ("czero", "cs.so", "mp.dll", "Counter-Strike:Condition Zero"),
    ("dcrisis", "dc_i386.so", "dc.dll", "Desert Crisis"),
    ("decay", "none", "decay.dll", "Half-Life: Decay"),
    ("dmc", "dmc.so", "dmc.dll", "Deathmatch Classic"),
    ("dod", "dod.so", "dod.dll", "Day of Defeat"),
    ("dpb", "pb.i386.so", "pb.dll", "Digital Paintball"),
    ("dragonmodz", "hl_i386.so", "mp.dll", "Dragon Mod Z"),
    ("esf", "hl_i386.so", "hl.dll", "Earth's Special Forces"),
    ("existence", "ex_i386.so", "existence.dll", "Existence"),
    ("firearms", "fa_i386.so", "firearms.dll", "Firearms"),
    ("firearms25", "fa_i386.so", "firearms.dll", "Retro Firearms"),
    ("freeze", "mp_i386.so", "mp.dll", "Freeze"),
    ("frontline", "front_i386.so", "frontline.dll", "Frontline Force"),
    ("gangstawars", "gangsta_i386.so", "gwars27.dll", "Gangsta Wars"),
    ("gangwars", "mp_i386.so", "mp.dll", "Gangwars"),
    ("gearbox", "opfor.so", "opfor.dll", "Opposing Force"),
    ("globalwarfare", "gw_i386.so", "mp.dll", "Global Warfare"),
    ("goldeneye", "golden_i386.so", "mp.dll", "Goldeneye"),
    ("hl15we", "hl_i386.so", "hl.dll", "Half-Life 1.5: Weapon Edition"),
    ("HLAinGOLDSrc", "none", "hl.dll", "Half-Life Alpha in GOLDSrc"),
    ("hlrally", "hlr_i386.so", "hlrally.dll", "HL-Rally"),
    ("holywars", "hl_i386.so", "holywars.dll", "Holy Wars"),
    ("hostileintent", "hl_i386.so", "hl.dll", "Hostile Intent"),
    ("ios", "ios_i386.so", "ios.dll", "International Online Soccer"),
    ("judgedm", "judge_i386.so", "mp.dll", "Judgement"),
    ("kanonball", "hl_i386.so", "kanonball.dll", "Kanonball"),
    ("monkeystrike", "ms_i386.so", "monkey.dll", "Monkeystrike"),
    ("MorbidPR", "morbid_i386.so", "morbid.dll", "Morbid Inclination"),
    ("movein", "hl_i386.so", "hl.dll", "Move In!"),
    ("msc", "none", "ms.dll", "Master Sword Continued"),
    ("ns", "ns.so", "ns.dll", "Natural Selection"),
    ("nsp", "ns_i386.so", "ns.dll", "Natural Selection Beta"),
    ("oel", "hl_i386.so", "hl.dll", "OeL Half-Life"),
    ("og", "og_i386.so", "og.dll", "Over Ground"),
    ("ol", "ol_i386.so", "hl.dll", "Outlawsmod"),
    ("ops1942", "spirit_i386.so", "spirit.dll", "Operations 1942"),
    ("osjb", "osjb_i386.so", "jail.dll", "Open-Source Jailbreak"),
    ("outbreak", "none", "hl.dll", "Out Break"),
    ("oz", "mp_i386.so", "mp.dll", "Oz Deathmatch"),
    ("paintball", "pb_i386.so", "mp.dll", "Paintball"),
    ("penemy", "pe_i386.so", "pe.dll", "Public Enemy"),
    ("phineas", "phineas_i386.so", "phineas.dll", "Phineas Bot"),
    ("ponreturn", "ponr_i386.so", "mp.dll", "Point of No Return"),
    ("pvk", "hl_i386.so", "hl.dll", "Pirates, Vikings and Knights"),
    ("rc2", "rc2_i386.so", "rc2.dll", "Rocket Crowbar 2"),
    ("recbb2", "recb_i386.so", "recb.dll", "Resident Evil : Cold Blood"),
    ("retrocs", "rcs_i386.so", "rcs.dll", "Retro Counter-Strike"),
    ("rewolf", "hl_i386.so", "gunman.dll", "Gunman Chronicles"),
    ("ricochet", "ricochet.so", "mp.dll", "Ricochet"),
    ("rockcrowbar", "rc_i386.so", "rc.dll", "Rocket Crowbar"),
    ("rspecies", "hl_i386.so", "hl.dll", "Rival Species"),
    ("scihunt", "shunt.so", "shunt.dll", "Scientist Hunt"),
    ("sdm", "sdmmod_i386.so", "sdmmod.dll", "Special Death Match"),
    ("Ship", "ship_i386.so", "ship.dll", "The Ship"),
    ("si", "si.so", "si.dll", "Science & Industry"),
    ("snow", "snow_i386.so", "snow.dll", "Snow-War"),
    ("stargatetc", "hl.so", "hl.dll", "StargateTC (Legacy v1.x)"),
    ("stargatetc", "stc_i386.so", "hl.dll", "StargateTC (v2.x)"),
    ("stargatetc", "stc_i386_opt.so", "hl.dll", "StargateTC (v2.x, optimised binary)"),
    ("svencoop", "hl_i386.so", "hl.dll", "Sven Coop [Modification]"),
    ("swarm", "swarm_i386.so", "swarm.dll", "Swarm"),
    ("tfc", "tfc.so", "tfc.dll", "Team Fortress Classic"),
    ("thewastes", "thewastes_i386.so", "thewastes.dll", "The Wastes"),
    ("timeless", "pt_i386.so", "timeless.dll", "Project Timeless"),
    ("tod", "hl_i386.so", "hl.dll", "Tour of Duty"),
    ("trainhunters", "th_i386.so", "th.dll", "Train Hunters"),
    ("trevenge", "trevenge.so", "trevenge.dll", "The Terrorist Revenge"),
    ("ts", "ts_i686.so", "mp.dll", "The Specialists"),
    ("tt", "tt_i386.so", "tt.dll", "The Trenches"),
    ("underworld", "uw_i386.so", "uw.dll", "Underworld Bloodline"),
    ("valve", "hl.so", "hl.dll", "Half-Life Deathmatch"),
    ("vs", "vs_i386.so", "mp.dll", "VampireSlayer"),
    ("wantedhl", "hl_i386.so", "wanted.dll", "Wanted!"),
    ("wasteland", "whl_linux.so", "mp.dll", "Wasteland"),
    ("weapon_wars", "ww_i386.so", "hl.dll", "Weapon Wars"),
    ("wizardwars", "wizardwars_i486.so", "wizardwars.dll", "Wizard Wars (Steam)"),
    ("wizardwars_beta", "wizardwars_i486.so", "wizardwars.dll", "Wizard Wars Beta (Steam)"),
    ("wizwars", "mp.so", "hl.dll", "Wizard Wars (Legacy)"),
    ("wormshl", "wormshl_i586.so", "wormshl.dll", "WormsHL (Legacy)"),
    ("wormshl", "wormshl_i686.so", "wormshl.dll", "WormsHL (Steam)"),
    ("zp", "none", "mp.dll", "Zombie Panic"),
];

#[derive(Debug)]
pub struct ModuleRegistry {
    entries: Vec<ModuleDescriptor>,
}

impl ModuleRegistry {
    /// The built-in catalogue, in declaration order.
    pub fn builtin() -> Self {
        Self::from_rows(CATALOGUE)
    }

    fn from_rows(rows: &[CatalogueRow]) -> Self {
        Self {
            entries: rows.iter().map(ModuleDescriptor::from_row).collect(),
        }
    }

    /// All descriptors matching `identifier`, case-insensitively, in
    /// catalogue order. Order is trial order for the resolver, so it must
    /// be preserved.
    pub fn lookup(&self, identifier: &str) -> Vec<&ModuleDescriptor> {
        self.entries
            .iter()
            .filter(|entry| entry.identifier.eq_ignore_ascii_case(identifier))
            .collect()
    }

    pub fn entries(&self) -> &[ModuleDescriptor] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::{ModuleRegistry, NO_ARTIFACT};
    use crate::core::platform::Os;

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = ModuleRegistry::builtin();
        let lower = registry.lookup("cstrike");
        let upper = registry.lookup("CStrike");
        assert_eq!(lower.len(), 1);
        assert_eq!(lower[0].description, "Counter-Strike");
        assert_eq!(lower[0].identifier, upper[0].identifier);
    }

    #[test]
    fn mixed_case_catalogue_identifiers_match_any_casing() {
        let registry = ModuleRegistry::builtin();
        for (query, description) in [
            ("ship", "The Ship"),
            ("SHIP", "The Ship"),
            ("morbidpr", "Morbid Inclination"),
            ("hlaingoldsrc", "Half-Life Alpha in GOLDSrc"),
        ] {
            let matches = registry.lookup(query);
            assert_eq!(matches.len(), 1, "{query}");
            assert_eq!(matches[0].description, description);
        }
    }

    #[test]
    fn catalogue_carries_the_full_historical_roster() {
        let registry = ModuleRegistry::builtin();
        assert_eq!(registry.entries().len(), 102);
        for identifier in [
            "arg",
            "dragonmodz",
            "firearms25",
            "gangstawars",
            "gangwars",
            "hcfrenzy",
            "hl15we",
            "hostileintent",
            "kanonball",
            "movein",
            "oel",
            "og",
            "recbb2",
            "rspecies",
            "sdm",
            "trevenge",
            "wizardwars_beta",
            "wizwars",
        ] {
            assert!(!registry.lookup(identifier).is_empty(), "{identifier}");
        }
    }

    #[test]
    fn duplicate_identifiers_keep_catalogue_order() {
        let registry = ModuleRegistry::builtin();
        let matches = registry.lookup("stargatetc");
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].linux_artifact, Some("hl.so"));
        assert_eq!(matches[1].linux_artifact, Some("stc_i386.so"));
        assert_eq!(matches[2].linux_artifact, Some("stc_i386_opt.so"));
    }

    #[test]
    fn none_sentinel_becomes_absent_artifact() {
        let registry = ModuleRegistry::builtin();
        let zp = registry.lookup("zp");
        assert_eq!(zp.len(), 1);
        assert_eq!(zp[0].artifact_for(Os::Linux), None);
        assert_eq!(zp[0].artifact_for(Os::Windows), Some("mp.dll"));
        // The sentinel itself never leaks through as a name.
        for entry in registry.entries() {
            assert_ne!(entry.linux_artifact, Some(NO_ARTIFACT));
            assert_ne!(entry.windows_artifact, Some(NO_ARTIFACT));
        }
    }

    #[test]
    fn unknown_identifier_matches_nothing() {
        let registry = ModuleRegistry::builtin();
        assert!(registry.lookup("no-such-module").is_empty());
    }
}
