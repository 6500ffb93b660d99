use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

/// One trading day of OHLCV data. `close` is split/dividend adjusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// A bar where only the close is known (all price fields set to it).
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}

fn table_key(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Daily price history for a set of tickers over one date range.
///
/// Tickers for which the provider returned nothing are simply absent,
/// the same way a multi-ticker download leaves out unknown symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    /// symbol → bars sorted by date, one bar per date
    series: BTreeMap<String, Vec<PriceBar>>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the bars for a symbol, sorting and dropping duplicate dates.
    /// An empty bar list leaves the symbol absent.
    pub fn insert(&mut self, symbol: &str, mut bars: Vec<PriceBar>) {
        let key = table_key(symbol);
        if bars.is_empty() {
            self.series.remove(&key);
            return;
        }
        bars.sort_by_key(|b| b.date);
        // keep the last bar reported for a date
        bars.reverse();
        bars.dedup_by_key(|b| b.date);
        bars.reverse();
        self.series.insert(key, bars);
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series.contains_key(&table_key(symbol))
    }

    pub fn bars(&self, symbol: &str) -> Option<&[PriceBar]> {
        self.series.get(&table_key(symbol)).map(|v| v.as_slice())
    }

    /// Symbols present in the table, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        self.series.keys().map(|s| s.as_str()).collect()
    }

    /// Number of symbols with data.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Sorted union of every trading date in the table.
    pub fn calendar(&self) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = self
            .series
            .values()
            .flat_map(|bars| bars.iter().map(|b| b.date))
            .collect();
        dates.into_iter().collect()
    }

    /// Closing prices of `symbol` laid out on `calendar`.
    ///
    /// Dates where the symbol did not trade carry the previous close forward;
    /// dates before its first bar are `None`. Unknown symbols yield all `None`.
    pub fn aligned_closes(&self, symbol: &str, calendar: &[NaiveDate]) -> Vec<Option<f64>> {
        let bars = self.bars(symbol).unwrap_or(&[]);
        let mut aligned = Vec::with_capacity(calendar.len());
        let mut idx = 0;
        let mut last = None;

        for date in calendar {
            while idx < bars.len() && bars[idx].date <= *date {
                last = Some(bars[idx].close);
                idx += 1;
            }
            aligned.push(last);
        }
        aligned
    }
}

/// Arguments of one history download, used as the memoization key.
///
/// Symbols are uppercased, sorted and deduplicated so that the same
/// ticker-set in a different order hits the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryRequest {
    symbols: Vec<String>,
    pub start: NaiveDate,
    /// Exclusive upper bound.
    pub end: NaiveDate,
}

impl HistoryRequest {
    pub fn new<I, S>(symbols: I, start: NaiveDate, end: NaiveDate) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = symbols
            .into_iter()
            .map(|s| s.as_ref().trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            symbols: set.into_iter().collect(),
            start,
            end,
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

/// Hit/miss counters for the history cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Default number of distinct downloads kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// In-memory memo of downloaded price tables.
///
/// Lifetime is the process: entries never expire on their own. When the
/// cache is full the oldest inserted entry is evicted. Tables are shared
/// through `Arc` so a hit never copies price data.
#[derive(Debug)]
pub struct HistoryCache {
    entries: HashMap<HistoryRequest, Arc<PriceTable>>,
    /// Insertion order, oldest first.
    order: VecDeque<HistoryRequest>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl HistoryCache {
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a table, counting the hit or miss.
    pub fn get(&mut self, request: &HistoryRequest) -> Option<Arc<PriceTable>> {
        match self.entries.get(request) {
            Some(table) => {
                self.hits += 1;
                Some(Arc::clone(table))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a table, evicting the oldest entries if over capacity.
    pub fn insert(&mut self, request: HistoryRequest, table: Arc<PriceTable>) {
        if self.entries.insert(request.clone(), table).is_none() {
            self.order.push_back(request);
        }
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn contains(&self, request: &HistoryRequest) -> bool {
        self.entries.contains_key(request)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every cached table. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}
