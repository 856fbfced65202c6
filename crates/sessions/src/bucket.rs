//! Live-count and peak-concurrency tracking.
//!
//! Peak tracking maintains a live-count map per dimension alongside the
//! bucket so no operation ever scans the session table.

use std::collections::HashMap;

use stats_core::{Dimension, Dimensions, UaClass};

/// Current live-session counts, total and per dimension value.
///
/// Incremented on open, decremented on close (saturating at zero); keys
/// whose count reaches zero are removed so the maps only hold values with
/// live sessions.
#[derive(Debug, Clone, Default)]
pub struct LiveCounts {
    pub total: u64,
    pub by_server: HashMap<String, u64>,
    pub by_channel: HashMap<String, u64>,
    pub by_country: HashMap<String, u64>,
    pub by_proto: HashMap<String, u64>,
    pub by_ua_class: HashMap<UaClass, u64>,
}

impl LiveCounts {
    pub fn increment(&mut self, dims: &Dimensions) {
        self.total += 1;
        *self.by_server.entry(dims.server.clone()).or_default() += 1;
        *self.by_channel.entry(dims.channel.clone()).or_default() += 1;
        *self.by_country.entry(dims.country.clone()).or_default() += 1;
        *self.by_proto.entry(dims.proto.clone()).or_default() += 1;
        *self.by_ua_class.entry(dims.ua_class).or_default() += 1;
    }

    pub fn decrement(&mut self, dims: &Dimensions) {
        self.total = self.total.saturating_sub(1);
        decrement_key(&mut self.by_server, &dims.server);
        decrement_key(&mut self.by_channel, &dims.channel);
        decrement_key(&mut self.by_country, &dims.country);
        decrement_key(&mut self.by_proto, &dims.proto);
        if let Some(count) = self.by_ua_class.get_mut(&dims.ua_class) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.by_ua_class.remove(&dims.ua_class);
            }
        }
    }

    /// Live count for one dimension value; the total for `Global`.
    pub fn get(&self, dimension: Dimension, dims: &Dimensions) -> u64 {
        match dimension {
            Dimension::Global => self.total,
            Dimension::Server => copied(&self.by_server, &dims.server),
            Dimension::Channel => copied(&self.by_channel, &dims.channel),
            Dimension::Country => copied(&self.by_country, &dims.country),
            Dimension::Protocol => copied(&self.by_proto, &dims.proto),
            Dimension::UserAgentClass => {
                self.by_ua_class.get(&dims.ua_class).copied().unwrap_or(0)
            }
        }
    }
}

fn copied(map: &HashMap<String, u64>, key: &str) -> u64 {
    map.get(key).copied().unwrap_or(0)
}

fn decrement_key(map: &mut HashMap<String, u64>, key: &str) {
    if let Some(count) = map.get_mut(key) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            map.remove(key);
        }
    }
}

/// Running per-minute maxima of concurrent sessions.
///
/// Seeded from the live counts at rotation, so a minute with no events
/// still reports the flat concurrency line of its still-live sessions.
/// Peaks only grow within a minute; closes never lower them.
#[derive(Debug, Clone, Default)]
pub struct MinuteBucket {
    pub peak_total: u64,
    pub peak_by_server: HashMap<String, u64>,
    pub peak_by_channel: HashMap<String, u64>,
    pub peak_by_country: HashMap<String, u64>,
    pub peak_by_proto: HashMap<String, u64>,
    pub peak_by_ua_class: HashMap<UaClass, u64>,
}

impl MinuteBucket {
    /// A fresh bucket whose peaks start at the current live counts.
    pub fn seeded_from(live: &LiveCounts) -> Self {
        Self {
            peak_total: live.total,
            peak_by_server: live.by_server.clone(),
            peak_by_channel: live.by_channel.clone(),
            peak_by_country: live.by_country.clone(),
            peak_by_proto: live.by_proto.clone(),
            peak_by_ua_class: live.by_ua_class.clone(),
        }
    }

    /// Raise peaks for the keys an open just touched.
    pub fn observe_open(&mut self, live: &LiveCounts, dims: &Dimensions) {
        self.peak_total = self.peak_total.max(live.total);
        raise(&mut self.peak_by_server, &dims.server, live.get(Dimension::Server, dims));
        raise(&mut self.peak_by_channel, &dims.channel, live.get(Dimension::Channel, dims));
        raise(&mut self.peak_by_country, &dims.country, live.get(Dimension::Country, dims));
        raise(&mut self.peak_by_proto, &dims.proto, live.get(Dimension::Protocol, dims));
        let ua_live = live.get(Dimension::UserAgentClass, dims);
        let peak = self.peak_by_ua_class.entry(dims.ua_class).or_default();
        *peak = (*peak).max(ua_live);
    }

    /// Peak for one dimension value; zero when the value never had a live
    /// session this minute.
    pub fn peak(&self, dimension: Dimension, value: &str) -> u64 {
        match dimension {
            Dimension::Global => self.peak_total,
            Dimension::Server => copied(&self.peak_by_server, value),
            Dimension::Channel => copied(&self.peak_by_channel, value),
            Dimension::Country => copied(&self.peak_by_country, value),
            Dimension::Protocol => copied(&self.peak_by_proto, value),
            Dimension::UserAgentClass => value
                .parse::<UaClass>()
                .ok()
                .and_then(|class| self.peak_by_ua_class.get(&class))
                .copied()
                .unwrap_or(0),
        }
    }

    /// Peak map keys for one breakdown dimension.
    pub fn keys(&self, dimension: Dimension) -> Vec<String> {
        match dimension {
            Dimension::Global => Vec::new(),
            Dimension::Server => self.peak_by_server.keys().cloned().collect(),
            Dimension::Channel => self.peak_by_channel.keys().cloned().collect(),
            Dimension::Country => self.peak_by_country.keys().cloned().collect(),
            Dimension::Protocol => self.peak_by_proto.keys().cloned().collect(),
            Dimension::UserAgentClass => self
                .peak_by_ua_class
                .keys()
                .map(|class| class.as_str().to_string())
                .collect(),
        }
    }

    /// True when nothing was live at the seed and nothing opened since.
    pub fn is_empty(&self) -> bool {
        self.peak_total == 0
    }
}

fn raise(map: &mut HashMap<String, u64>, key: &str, live: u64) {
    match map.get_mut(key) {
        Some(peak) => *peak = (*peak).max(live),
        None => {
            map.insert(key.to_string(), live);
        }
    }
}
