#![no_main]

use libfuzzer_sys::fuzz_target;
use riskforest::dataset::PopulationDataset;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed CSV must surface as an error, never a panic
        let _ = PopulationDataset::from_csv_str(input);
    }
});
