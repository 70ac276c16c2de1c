//! Universes: a benchmark plus the members ranked against it.

use serde::{Deserialize, Serialize};

use crate::fetch::FetchJob;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<String>,
}

impl Member {
    pub fn new(name: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            alternate: None,
        }
    }

    fn with_alternate(mut self, alternate: &str) -> Self {
        if alternate != self.symbol {
            self.alternate = Some(alternate.to_string());
        }
        self
    }

    pub fn job(&self) -> FetchJob {
        FetchJob {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            alternate: self.alternate.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub benchmark: Member,
    pub members: Vec<Member>,
}

/// (name, index symbol, ETF proxy)
const NSE_SECTORS: &[(&str, &str, &str)] = &[
    ("PSU Bank", "^NIFTYPSUBANK", "PSUBNKBEES.NS"),
    ("Pvt Bank", "^NIFTYBANK", "PVTBANIETF.NS"),
    ("IT", "^CNXIT", "ITBEES.NS"),
    ("Pharma", "^CNXPHARMA", "PHARMABEES.NS"),
    ("FMCG", "^CNXFMCG", "ICICIFMCG.NS"),
    ("Auto", "^CNXAUTO", "AUTOBEES.NS"),
    ("Metal", "^CNXMETAL", "METALIETF.NS"),
    ("Realty", "^CNXREALTY", "MOREALTY.NS"),
    ("Media", "^CNXMEDIA", "^CNXMEDIA"),
    ("Energy", "^CNXENERGY", "MOENERGY.NS"),
    ("Infra", "^CNXINFRA", "INFRAIETF.NS"),
    ("Commodities", "^CNXCOMMODITIES", "^CNXCOMMODITIES"),
    ("Defence", "^CNXDEFENCE", "DEFENCEBEES.NS"),
    ("Oil & Gas", "^CNXOILGAS", "OILETF.NS"),
    ("Nifty Oil & Gas", "^NIFTIT_OIL_AND_GAS", "^NIFTY_OIL_AND_GAS"),
    ("Nifty India Defence", "^NIFTY_INFRA", "^NIFTY_INFRA"),
    ("Nifty Fin Services Ex-Bank", "^NIFTYFINSERV", "^NIFTYFINSERV"),
];

pub const NIFTY_50: (&str, &str) = ("Nifty 50", "^NSEI");

impl Universe {
    pub fn new(benchmark: Member, members: Vec<Member>) -> Self {
        Self { benchmark, members }
    }

    /// NSE sector indices against the Nifty 50.
    pub fn nse_sectors() -> Self {
        let members = NSE_SECTORS
            .iter()
            .map(|&(name, index, _)| Member::new(name, index))
            .collect();
        Self::new(Member::new(NIFTY_50.0, NIFTY_50.1), members)
    }

    /// Sector ETF proxies, falling back to the matching index when an ETF
    /// has no data.
    pub fn sector_etfs() -> Self {
        let members = NSE_SECTORS
            .iter()
            .map(|&(name, index, etf)| Member::new(name, etf).with_alternate(index))
            .collect();
        Self::new(Member::new(NIFTY_50.0, NIFTY_50.1), members)
    }

    /// Every distinct symbol, benchmark first, alternates included.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out: Vec<&str> = vec![self.benchmark.symbol.as_str()];
        for member in &self.members {
            for symbol in std::iter::once(&member.symbol).chain(member.alternate.as_ref()) {
                if !out.contains(&symbol.as_str()) {
                    out.push(symbol.as_str());
                }
            }
        }
        out
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn jobs(&self) -> Vec<FetchJob> {
        self.members.iter().map(Member::job).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sectors_have_unique_names() {
        let u = Universe::nse_sectors();
        assert_eq!(u.benchmark.symbol, "^NSEI");
        assert_eq!(u.members.len(), 17);
        let mut names: Vec<&str> = u.members.iter().map(|m| m.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 17);
        assert!(u.members.iter().all(|m| m.alternate.is_none()));
    }

    #[test]
    fn etfs_fall_back_to_index() {
        let u = Universe::sector_etfs();
        let it = u.member("IT").unwrap();
        assert_eq!(it.symbol, "ITBEES.NS");
        assert_eq!(it.alternate.as_deref(), Some("^CNXIT"));

        // members already quoted as an index have nothing to fall back to
        assert_eq!(u.member("Media").unwrap().alternate, None);
    }

    #[test]
    fn symbols_are_distinct() {
        let u = Universe::sector_etfs();
        let symbols = u.symbols();
        assert_eq!(symbols[0], "^NSEI");
        let mut sorted = symbols.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), symbols.len());
        assert!(symbols.contains(&"^CNXIT"));
        assert!(symbols.contains(&"ITBEES.NS"));
    }
}
