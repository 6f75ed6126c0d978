use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;
use stocknet::network::metrics::mean_degree;
use stocknet::{
    CorrelationMatrix, DataProvider, DateRange, GraphSummary, InMemoryDataProvider,
    PercolationSweep, PricePoint, PriceTable, ReturnMatrix, SectorMap, SectorReport,
    SqlitePriceStore, Symbol, ThresholdGraph, ThresholdRange,
};

const DAYS: usize = 250;
const IT: [&str; 4] = ["TCS.NS", "INFY.NS", "WIPRO.NS", "HCLTECH.NS"];
const BANKS: [&str; 3] = ["HDFCBANK.NS", "ICICIBANK.NS", "SBIN.NS"];
const FLAT: &str = "FLAT.NS";

/// Deterministic xorshift noise in [-1, 1).
struct Noise(u64);

impl Noise {
    fn next(&mut self) -> f64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
    }
}

fn sym(s: &str) -> Symbol {
    Symbol::new(s).unwrap()
}

fn dates() -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    (0..DAYS).map(|i| start + Duration::days(i as i64)).collect()
}

/// Two sectors driven by independent factors plus a constant-price stock.
///
/// Within a sector returns are ~0.96 correlated; across sectors they are
/// independent.
fn synthetic_series() -> Vec<(Symbol, Vec<PricePoint>)> {
    let mut noise = Noise(0x9E37_79B9_7F4A_7C15);
    let days = dates();
    let it_factor: Vec<f64> = (0..DAYS).map(|_| noise.next()).collect();
    let bank_factor: Vec<f64> = (0..DAYS).map(|_| noise.next()).collect();

    let mut series = Vec::new();
    for (names, factor) in [(&IT[..], &it_factor), (&BANKS[..], &bank_factor)] {
        for name in names {
            let mut price = 100.0;
            let points = days
                .iter()
                .zip(factor)
                .map(|(&date, f)| {
                    price *= (0.01 * (f + 0.2 * noise.next())).exp();
                    PricePoint::new(date, price)
                })
                .collect();
            series.push((sym(name), points));
        }
    }
    series.push((
        sym(FLAT),
        days.iter().map(|&date| PricePoint::new(date, 50.0)).collect(),
    ));
    series
}

fn correlation() -> CorrelationMatrix {
    let table = PriceTable::from_series(synthetic_series()).unwrap();
    CorrelationMatrix::pearson(&ReturnMatrix::from_prices(&table)).unwrap()
}

fn sector_map() -> SectorMap {
    let mut map = SectorMap::new();
    for name in IT {
        map.insert(sym(name), "Information Technology");
    }
    for name in BANKS {
        map.insert(sym(name), "Financial Services");
    }
    map
}

#[test]
fn csv_to_graph_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prices.csv");
    PriceTable::from_series(synthetic_series())
        .unwrap()
        .write_csv(&path)
        .unwrap();

    let table = PriceTable::load_csv(&path).unwrap();
    assert_eq!(table.num_dates(), DAYS);
    assert_eq!(table.num_symbols(), 8);

    let returns = ReturnMatrix::from_prices(&table);
    assert_eq!(returns.num_observations(), DAYS - 1);

    let corr = CorrelationMatrix::pearson(&returns).unwrap();
    assert!(corr.is_symmetric(1e-12));
    assert_eq!(corr.degenerate_symbols(), &[sym(FLAT)]);
    for name in IT.iter().chain(&BANKS) {
        let i = corr.position(&sym(name)).unwrap();
        assert!((corr.get(i, i) - 1.0).abs() < 1e-12);
    }

    let graph = ThresholdGraph::from_correlation(&corr, 0.5);
    let summary = GraphSummary::of(&graph);
    // K4 of IT stocks, K3 of banks, FLAT isolated
    assert_eq!(summary.node_count, 8);
    assert_eq!(summary.edge_count, 9);
    assert!((summary.mean_degree - 2.25).abs() < 1e-12);
    assert!((summary.transitivity - 1.0).abs() < 1e-12);
    assert!((summary.largest_component_fraction - 0.5).abs() < 1e-12);
    assert_eq!(graph.degree(&sym(FLAT)), Some(0));
    assert!(!graph.has_edge(&sym("TCS.NS"), &sym("SBIN.NS")));
}

#[test]
fn edge_sets_shrink_as_threshold_rises() {
    let corr = correlation();
    let thresholds = [-1.0, -0.2, 0.0, 0.1, 0.3, 0.5, 0.9, 0.97, 1.0];
    let edge_sets: Vec<BTreeSet<(Symbol, Symbol)>> = thresholds
        .iter()
        .map(|&theta| ThresholdGraph::from_correlation(&corr, theta).edge_set())
        .collect();

    for pair in edge_sets.windows(2) {
        assert!(pair[1].is_subset(&pair[0]));
    }
}

#[test]
fn extreme_thresholds() {
    let corr = correlation();

    // Every pair with a finite correlation; FLAT has none.
    let complete = ThresholdGraph::from_correlation(&corr, -1.0);
    assert_eq!(complete.edge_count(), 7 * 6 / 2);
    assert_eq!(complete.degree(&sym(FLAT)), Some(0));

    let empty = ThresholdGraph::from_correlation(&corr, 1.0 + 1e-9);
    assert_eq!(empty.edge_count(), 0);
    assert_eq!(empty.node_count(), 8);
}

#[test]
fn mean_degree_matches_edge_count() {
    let corr = correlation();
    for theta in ThresholdRange::default().values() {
        let graph = ThresholdGraph::from_correlation(&corr, theta);
        let expected = 2.0 * graph.edge_count() as f64 / graph.node_count() as f64;
        assert!((mean_degree(&graph) - expected).abs() < 1e-12);
    }
}

#[test]
fn three_symbol_example() {
    let corr = CorrelationMatrix::from_values(
        vec![sym("A"), sym("B"), sym("C")],
        vec![1.0, 0.6, 0.3, 0.6, 1.0, 0.55, 0.3, 0.55, 1.0],
    )
    .unwrap();
    let graph = ThresholdGraph::from_correlation(&corr, 0.5);

    let expected: BTreeSet<(Symbol, Symbol)> = [(sym("A"), sym("B")), (sym("B"), sym("C"))]
        .into_iter()
        .collect();
    assert_eq!(graph.edge_set(), expected);
    assert_eq!(
        graph.degrees(),
        vec![(sym("A"), 1), (sym("B"), 2), (sym("C"), 1)]
    );
    assert!((mean_degree(&graph) - 4.0 / 3.0).abs() < 1e-12);
}

#[test]
fn sweep_largest_component_never_grows() {
    let corr = correlation();
    let sweep = PercolationSweep::over_range(&corr, &ThresholdRange::default());
    assert_eq!(sweep.points().len(), 26);
    for pair in sweep.points().windows(2) {
        assert!(pair[1].largest_component_fraction <= pair[0].largest_component_fraction);
        assert!(pair[1].edge_count <= pair[0].edge_count);
    }

    let at_half = sweep.closest_to(0.5).unwrap();
    assert_eq!(at_half.theta, 0.5);
    assert!((at_half.largest_component_fraction - 0.5).abs() < 1e-12);
}

#[test]
fn saved_graph_loads_identically() {
    let graph = ThresholdGraph::from_correlation(&correlation(), 0.5);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nifty500_network.json");

    graph.save(&path).unwrap();
    let loaded = ThresholdGraph::load(&path).unwrap();

    assert_eq!(loaded.theta(), graph.theta());
    assert_eq!(loaded.node_count(), graph.node_count());
    assert_eq!(loaded.edge_set(), graph.edge_set());
    assert_eq!(GraphSummary::of(&loaded), GraphSummary::of(&graph));
}

#[test]
fn sector_report_from_graph() {
    let graph = ThresholdGraph::from_correlation(&correlation(), 0.5);
    let report = SectorReport::compute(&graph, &sector_map());
    let rows = report.rows();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].industry, "Information Technology");
    assert_eq!(rows[0].num_stocks, 4);
    assert!((rows[0].avg_degree - 3.0).abs() < 1e-12);
    assert!((rows[0].avg_clustering - 1.0).abs() < 1e-12);
    assert_eq!(rows[0].avg_betweenness, 0.0);
    assert_eq!(rows[1].industry, "Financial Services");
    assert!((rows[1].avg_degree - 2.0).abs() < 1e-12);
}

#[test]
fn price_table_from_store_and_memory() {
    let range = DateRange::new(dates()[0], dates()[DAYS - 1]);
    let mut store = SqlitePriceStore::new_in_memory().unwrap();
    let mut memory = InMemoryDataProvider::new();
    let mut symbols = Vec::new();

    for (symbol, points) in synthetic_series() {
        store.insert_series(&symbol, &points).unwrap();
        memory.add_data(symbol.clone(), points);
        symbols.push(symbol);
    }
    // A stock with a gap is dropped from the cleaned table.
    let gappy = sym("GAPPY.NS");
    let points: Vec<PricePoint> = dates()
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i != 10)
        .map(|(_, date)| PricePoint::new(date, 10.0))
        .collect();
    store.insert_series(&gappy, &points).unwrap();
    symbols.push(gappy.clone());
    symbols.push(sym("MISSING.NS"));

    let from_store = PriceTable::from_provider(&store, &symbols, &range).unwrap();
    assert_eq!(from_store.num_symbols(), 8);
    assert!(from_store.series(&gappy).is_none());

    let from_memory = PriceTable::from_provider(&memory, &symbols, &range).unwrap();
    assert_eq!(from_memory.symbols(), from_store.symbols());
    assert_eq!(store.symbols().unwrap().len(), 9);
}
