//! Level tables: channel volume, pan law and key scale level.

#[allow(unused_imports)]
use num_traits::float::Float;

/// Attenuation in dB for the upper 5 bits of volume, expression and velocity.
/// Entry 0 is treated as silence.
const VOLUME_ATTENUATION_DB: [f64; 32] = [
    0.0, 47.9, 42.6, 37.2, 33.1, 29.8, 27.0, 24.6, 22.4, 20.6, 18.9, 17.3, 15.9, 14.6, 13.4, 12.2,
    11.1, 10.1, 9.2, 8.3, 7.4, 6.6, 5.8, 5.1, 4.4, 3.6, 3.0, 2.3, 1.7, 1.1, 0.6, 0.0,
];

const KSL_BASE_DB: [f64; 4] = [0.0, 0.08, 1.0 / 15.0, 1.0 / 15.0];
const KSL_BLOCK_DB: [f64; 4] = [0.0, 3.0, 1.5, 6.01];
const KSL_FNUM_DB: [f64; 4] = [0.0, 0.38, 0.185, 0.75];

pub fn volume_table() -> [f64; 32] {
    core::array::from_fn(|i| {
        if i == 0 {
            0.0
        } else {
            10f64.powf(-VOLUME_ATTENUATION_DB[i] / 20.0)
        }
    })
}

pub fn pan_table() -> [[f64; 2]; 128] {
    core::array::from_fn(|i| {
        let theta = core::f64::consts::FRAC_PI_2 * i as f64 / 127.0;
        [theta.cos(), theta.sin()]
    })
}

pub fn ksl_table() -> [[[f64; 32]; 8]; 4] {
    core::array::from_fn(|ksl| {
        core::array::from_fn(|block| {
            core::array::from_fn(|fnum5| {
                let fnum5 = fnum5.min(15) as f64;
                let mut db = KSL_BASE_DB[ksl]
                    - KSL_BLOCK_DB[ksl] * (block as f64 - 2.0)
                    - KSL_FNUM_DB[ksl] * (fnum5 - 7.0);

                if block < 2 || db >= 0.0 {
                    db = 0.0;
                }

                10f64.powf(db / 20.0)
            })
        })
    })
}
