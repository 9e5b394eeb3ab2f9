//! Default paths, analysis window and column names shared by the cleaning,
//! merge and dashboard stages.

// Analysis window shared by IBTrACS and ERA5
pub const START_YEAR: i32 = 1950;
pub const END_YEAR: i32 = 2023;

// IBTrACS input
pub const RAW_TRACKS_PATH: &str = "data/raw/IBTrACS/ibtracs_wp_full.csv.gz";
pub const PH_GEOJSON_PATH: &str = "data/raw/boundaries/philippines.geojson";

// IBTrACS outputs
pub const PAR_TRACKS_PATH: &str =
    "data/processed/IBTrACS/v3_within_par/ibtracs_par_1950_2023_tracks_3.csv";
pub const PAR_STORMS_PATH: &str =
    "data/processed/IBTrACS/v3_within_par/ibtracs_par_1950_2023_storms_3.csv";
pub const LANDFALL_TRACKS_PATH: &str =
    "data/processed/IBTrACS/v4_landfall/ibtracs_ph_landfall_1950_2023_tracks.csv";
pub const LANDFALL_STORMS_PATH: &str =
    "data/processed/IBTrACS/v4_landfall/ibtracs_ph_landfall_1950_2023_storms.csv";

// ERA5 input + output
pub const RAW_ERA5_DIR: &str = "data/raw/era5";
pub const ERA5_JSON_FILES: [&str; 3] = [
    "era5_phl_annual_1950_2023_cdd_r50mm_r95ptot.json",
    "era5_phl_annual_1950_2023_cwd_rx1day_rx5day.json",
    "era5_phl_annual_1950_2023_pr_prpercent_r20mm.json",
];
pub const ERA5_OUTPUT_CSV_PATH: &str = "data/processed/ERA5/merged_era5_data.csv";
pub const ERA5_COUNTRY_CODE: &str = "PHL";
pub const ERA5_COLUMN_ORDER: [&str; 10] = [
    "year",
    "cdd",
    "r50mm",
    "r95ptot",
    "cwd",
    "rx1day",
    "rx5day",
    "pr",
    "prpercent",
    "r20mm",
];

// Raw IBTrACS columns
pub const COL_SID: &str = "SID";
pub const COL_ISO_TIME: &str = "ISO_TIME";
pub const COL_LAT: &str = "LAT";
pub const COL_LON: &str = "LON";
pub const COL_NATURE: &str = "NATURE";
pub const WIND_COLUMN: &str = "USA_WIND";

// Derived track columns
pub const COL_YEAR: &str = "year";
pub const COL_LON_180: &str = "LON_180";
pub const COL_IN_PAR: &str = "in_par";
pub const COL_ON_PH_LAND: &str = "on_ph_land";

// Storm summary columns
pub const COL_START_TIME: &str = "start_time";
pub const COL_END_TIME: &str = "end_time";
pub const COL_START_YEAR: &str = "start_year";
pub const COL_MAX_WIND: &str = "max_wind";
pub const COL_N_TRACK_POINTS: &str = "n_track_points";
pub const COL_MEAN_LAT: &str = "mean_lat";
pub const COL_MEAN_LON: &str = "mean_lon";
pub const COL_PEAK_INTENSITY: &str = "peak_intensity";
pub const COL_PAR_MAX_WIND: &str = "par_max_wind";
pub const COL_PAR_PEAK_INTENSITY: &str = "par_peak_intensity";
pub const COL_ANY_LANDFALL: &str = "any_landfall";
pub const COL_FIRST_LANDFALL_TIME: &str = "first_landfall_time";
pub const COL_FIRST_LANDFALL_LAT: &str = "first_landfall_lat";
pub const COL_FIRST_LANDFALL_LON: &str = "first_landfall_lon";
pub const COL_FIRST_LANDFALL_WIND: &str = "first_landfall_wind";
pub const COL_FIRST_LANDFALL_NATURE: &str = "first_landfall_nature";
pub const COL_LANDFALL_INTENSITY: &str = "landfall_intensity";

/// Tropical-only category codes kept by the PAR preset.
pub const TROPICAL_NATURES: [&str; 3] = ["TD", "TS", "TY"];

/// Timestamp format used for every time column written to CSV.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
