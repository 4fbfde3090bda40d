// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use umbra_fhe::GamePreset;

pub fn execute() {
    println!("{:<20} {:>7} {:>7} {:>7}", "PRESET", "DEGREE", "MODULI", "LAMBDA");
    for preset in GamePreset::ALL {
        let meta = preset.metadata();
        println!(
            "{:<20} {:>7} {:>7} {:>7}",
            meta.name, meta.degree, meta.num_moduli, meta.lambda
        );
    }
}
