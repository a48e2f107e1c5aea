//! Static outlet directory: maps each outlet to its business-segment
//! category and cluster. Seeded once per session; the admin surface may
//! edit the in-memory copy, nothing is persisted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub id: u32,
    pub serial_no: u32,
    pub category: String,
    pub cluster: String,
    pub outlet: String,
}

/// (serial_no, category, cluster, outlet)
const SEED: &[(u32, &str, &str, &str)] = &[
    (1, "C", "1-Shijoy", "Akshaya Nagar"),
    (2, "A", "1-Shijoy", "Malleshwaram"),
    (3, "C", "1-Shijoy", "Jayanagar"),
    (4, "A", "1-Shijoy", "Sarjapura Road"),
    (5, "A", "1-Shijoy", "JP Nagar"),
    (6, "D", "1-Shijoy", "Chitradurga"),
    (7, "Express Outlet", "1-Shijoy", "Malleshwaram Paakashaala"),
    (1, "D", "2-Ranjith", "Hassan"),
    (2, "B", "2-Ranjith", "Yelahanka"),
    (3, "D", "2-Ranjith", "Andrahalli"),
    (4, "C", "2-Ranjith", "TC Palya"),
    (5, "A", "2-Ranjith", "Koramangala"),
    (6, "A", "2-Ranjith", "Whitefield"),
    (1, "C", "3-Anand", "Kanakpura Road"),
    (2, "A", "3-Anand", "Vijayanagar"),
    (3, "B", "3-Anand", "Tumkur"),
    (4, "C", "3-Anand", "Vishweshwaraiah layout"),
    (5, "Express Outlet", "3-Anand", "T- Begur"),
    (6, "D", "3-Anand", "Mandya"),
    (1, "D", "4-Praveen", "Peenya"),
    (2, "C", "4-Praveen", "RR Nagar"),
    (3, "B", "4-Praveen", "Shimoga"),
    (4, "B", "4-Praveen", "Sahakar Nagar"),
    (5, "A", "4-Praveen", "Mangalore"),
    (6, "Express Outlet", "4-Praveen", "Mangalore Pakashala"),
    (1, "C", "5-Prasant Mishra", "Kammanahalli"),
    (2, "C", "5-Prasant Mishra", "Thanisandra"),
    (3, "Express Outlet", "5-Prasant Mishra", "Nandi Upachar"),
    (4, "A", "5-Prasant Mishra", "HSR Layout"),
    (5, "Express Outlet", "5-Prasant Mishra", "1 MG"),
    (1, "Express Outlet", "6-Umesh", "JP Nagar Paakashaala"),
    (2, "B", "6-Umesh", "Sanjaynagar"),
    (3, "Express Outlet", "6-Umesh", "Bangalore Club"),
    (4, "B", "6-Umesh", "Kengeri"),
    (5, "Express Outlet", "6-Umesh", "Mandya Pakashala"),
    (6, "Express Outlet", "6-Umesh", "Channapatna"),
    (1, "D", "7-Piyush", "Basavanagudi"),
    (5, "C", "7-Piyush", "Udupi"),
    (2, "D", "7-Piyush", "Ananth Nagar"),
    (3, "A", "7-Piyush", "Indiranagar"),
    (4, "Express Outlet", "7-Piyush", "Uttarahalli"),
    (1, "D", "8-Rajesh Khanna", "Mysuru Urs Road"),
    (2, "D", "8-Rajesh Khanna", "Mysuru Kalidasa Road"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDirectory {
    entries: Vec<StoreEntry>,
    next_id: u32,
}

impl Default for StoreDirectory {
    fn default() -> Self {
        Self::seeded()
    }
}

impl StoreDirectory {
    /// Directory populated from the built-in reference table.
    pub fn seeded() -> Self {
        let entries: Vec<StoreEntry> = SEED
            .iter()
            .enumerate()
            .map(|(idx, (serial_no, category, cluster, outlet))| StoreEntry {
                id: idx as u32,
                serial_no: *serial_no,
                category: (*category).to_string(),
                cluster: (*cluster).to_string(),
                outlet: (*outlet).to_string(),
            })
            .collect();
        let next_id = entries.len() as u32;
        Self { entries, next_id }
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    pub fn entries(&self) -> &[StoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds an entry and returns its synthetic id.
    pub fn add(&mut self, serial_no: u32, category: &str, cluster: &str, outlet: &str) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(StoreEntry {
            id,
            serial_no,
            category: category.to_string(),
            cluster: cluster.to_string(),
            outlet: outlet.to_string(),
        });
        id
    }

    /// Replaces the fields of the entry with the given id. Returns false
    /// when no such entry exists.
    pub fn update(&mut self, id: u32, entry: StoreEntry) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => {
                *existing = StoreEntry { id, ..entry };
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: u32) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn get(&self, id: u32) -> Option<&StoreEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// The directory entry for an outlet, matched on exact name.
    pub fn entry_for_outlet(&self, outlet: &str) -> Option<&StoreEntry> {
        self.entries.iter().find(|e| e.outlet == outlet)
    }

    pub fn category_of(&self, outlet: &str) -> Option<&str> {
        self.entry_for_outlet(outlet).map(|e| e.category.as_str())
    }

    pub fn cluster_of(&self, outlet: &str) -> Option<&str> {
        self.entry_for_outlet(outlet).map(|e| e.cluster.as_str())
    }

    pub fn in_category(&self, category: &str) -> Vec<&StoreEntry> {
        self.entries.iter().filter(|e| e.category == category).collect()
    }

    pub fn in_cluster(&self, cluster: &str) -> Vec<&StoreEntry> {
        self.entries.iter().filter(|e| e.cluster == cluster).collect()
    }

    pub fn outlet_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.outlet.as_str()).collect()
    }

    pub fn categories(&self) -> Vec<String> {
        let mut out: Vec<String> = self.entries.iter().map(|e| e.category.clone()).collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn clusters(&self) -> Vec<String> {
        let mut out: Vec<String> = self.entries.iter().map(|e| e.cluster.clone()).collect();
        out.sort();
        out.dedup();
        out
    }

    /// Case-insensitive substring match on outlet name.
    pub fn find_outlets(&self, name: &str) -> Vec<&StoreEntry> {
        let needle = name.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.outlet.to_lowercase().contains(&needle))
            .collect()
    }

    /// Free-text search across outlet, category, cluster and serial number.
    pub fn search(&self, term: &str) -> Vec<&StoreEntry> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|e| {
                e.outlet.to_lowercase().contains(&term)
                    || e.category.to_lowercase().contains(&term)
                    || e.cluster.to_lowercase().contains(&term)
                    || e.serial_no.to_string().contains(&term)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_directory() {
        let dir = StoreDirectory::seeded();
        assert_eq!(dir.len(), 43);
        assert_eq!(dir.category_of("Akshaya Nagar"), Some("C"));
        assert_eq!(dir.cluster_of("Koramangala"), Some("2-Ranjith"));
        assert_eq!(dir.category_of("No Such Outlet"), None);
    }

    #[test]
    fn test_categories_sorted_dedup() {
        let dir = StoreDirectory::seeded();
        let categories = dir.categories();
        assert_eq!(categories, vec!["A", "B", "C", "D", "Express Outlet"]);
        assert_eq!(dir.clusters().len(), 8);
    }

    #[test]
    fn test_crud_round_trip() {
        let mut dir = StoreDirectory::seeded();
        let id = dir.add(9, "A", "1-Shijoy", "New Outlet");
        assert_eq!(dir.category_of("New Outlet"), Some("A"));

        let mut entry = dir.get(id).unwrap().clone();
        entry.category = "B".to_string();
        assert!(dir.update(id, entry));
        assert_eq!(dir.category_of("New Outlet"), Some("B"));

        assert!(dir.delete(id));
        assert!(!dir.delete(id));
        assert_eq!(dir.category_of("New Outlet"), None);
    }

    #[test]
    fn test_search() {
        let dir = StoreDirectory::seeded();
        assert_eq!(dir.find_outlets("mysuru").len(), 2);
        assert!(dir.search("rajesh").len() >= 2);
        assert_eq!(dir.search("").len(), dir.len());
    }
}
