// --- Helper Functions ---

/// Widens 8-bit cell values to the u32 words the GPU storage buffers hold.
pub fn cells_to_words(cells: &[u8]) -> Vec<u32> {
    cells.iter().map(|&c| c as u32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widens_each_cell() {
        assert_eq!(cells_to_words(&[0, 1, 1, 0]), vec![0u32, 1, 1, 0]);
        assert!(cells_to_words(&[]).is_empty());
    }
}
