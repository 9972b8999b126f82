/// Column names expected in the track dataset.
/// These match the header row of the exported playlist CSV.
pub const RELEASE_DATE_COLUMN: &str = "Release Date";
pub const GENRES_COLUMN: &str = "Genres";
pub const ARTIST_COLUMN: &str = "Artist Name(s)";
pub const POPULARITY_COLUMN: &str = "Popularity";
pub const DANCEABILITY_COLUMN: &str = "Danceability";
pub const VALENCE_COLUMN: &str = "Valence";
pub const ENERGY_COLUMN: &str = "Energy";
pub const TEMPO_COLUMN: &str = "Tempo";

// Derived column
pub const YEAR_COLUMN: &str = "year";

/// Columns that must be present before any transform runs
pub const REQUIRED_COLUMNS: [&str; 8] = [
    RELEASE_DATE_COLUMN,
    GENRES_COLUMN,
    ARTIST_COLUMN,
    POPULARITY_COLUMN,
    DANCEABILITY_COLUMN,
    VALENCE_COLUMN,
    ENERGY_COLUMN,
    TEMPO_COLUMN,
];

/// Cell texts read as "no value", in addition to the empty cell.
/// Matched exactly, as the common spreadsheet and dataframe exports write them.
pub const NA_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Separator between tags in the genre column
pub const GENRE_SEPARATOR: char = ',';

// Chart file stems (the sink appends the extension)
pub const ARTIST_POPULARITY_CHART: &str = "artist_popularity";
pub const GENRE_TOP_CHART: &str = "genre_distribution_top_50";
pub const GENRE_BOTTOM_CHART: &str = "genre_distribution_bottom_50";
pub const DANCEABILITY_CHART: &str = "danceability_comparison";
pub const VALENCE_ENERGY_CHART: &str = "valence_vs_energy";
pub const TEMPO_BY_GENRE_CHART: &str = "tempo_distribution_by_genre";

/// Every chart the pipeline renders, in render order
pub fn chart_names() -> Vec<&'static str> {
    vec![
        ARTIST_POPULARITY_CHART,
        GENRE_TOP_CHART,
        GENRE_BOTTOM_CHART,
        DANCEABILITY_CHART,
        VALENCE_ENERGY_CHART,
        TEMPO_BY_GENRE_CHART,
    ]
}

// Defaults
pub const DEFAULT_INPUT_PATH: &str = "origins.csv";
pub const DEFAULT_CONFIG_PATH: &str = "track_analysis.toml";
pub const DEFAULT_TOP_ARTISTS: usize = 10;
pub const DEFAULT_TRACK_SAMPLE: usize = 50;
pub const DEFAULT_TOP_GENRES: usize = 10;
pub const DEFAULT_PREVIEW_ROWS: usize = 5;
pub const DEFAULT_CHART_WIDTH: u32 = 1200;
pub const DEFAULT_CHART_HEIGHT: u32 = 800;
