use super::{LinkKind, Location, PositionResolver, Span};
use crate::{ConfigurationError, Error, QueryError};
use itertools::Itertools;
use rand::Rng;
use rand_distr::Distribution;
use serde::Deserialize;

/// How vehicles are spread across the network when a scenario starts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    /// Evenly spaced.
    #[default]
    Uniform,
    /// Randomly spaced, subject to a minimum gap.
    Random,
}

/// The initial placement of vehicles.
///
/// Vehicles are placed along the placement coordinate: the global coordinate
/// itself, or the listed edges laid end to end in order of offset when
/// `edges_distribution` is given. Only a closed network without an edge list
/// wraps around.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InitialConfig {
    /// The position of the first vehicle in the placement coordinate, in m.
    pub x0: f64,
    pub spacing: Spacing,
    /// The standard deviation of the normally distributed perturbation
    /// applied to uniformly spaced vehicles, in m.
    pub perturbation: f64,
    /// The length of network to leave empty behind the last vehicle, in m.
    pub bunching: f64,
    /// The minimum gap between randomly spaced vehicles, in m.
    pub min_gap: f64,
    /// The edges to place vehicles on; all links if unset.
    pub edges_distribution: Option<Vec<String>>,
    /// The number of lanes to spread vehicles over; every lane of each edge if unset.
    pub lanes_distribution: Option<u32>,
}

/// A vehicle's starting position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartPosition<'a> {
    pub location: Location<'a>,
    /// The lane index, counted from zero.
    pub lane: u32,
}

impl InitialConfig {
    /// Parses and validates a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.x0.is_finite() {
            return Err(ConfigurationError::invalid("x0", "must be finite"));
        }
        let non_negative = [
            ("perturbation", self.perturbation),
            ("bunching", self.bunching),
            ("min_gap", self.min_gap),
        ];
        for (key, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                let reason = format!("{} is negative or not finite", value);
                return Err(ConfigurationError::invalid(key, reason));
            }
        }
        if let Some(edges) = &self.edges_distribution {
            if edges.is_empty() {
                return Err(ConfigurationError::invalid("edges_distribution", "is empty"));
            }
            if let Some(id) = edges.iter().duplicates().next() {
                let reason = format!("`{}` is listed more than once", id);
                return Err(ConfigurationError::invalid("edges_distribution", reason));
            }
        }
        if self.lanes_distribution == Some(0) {
            return Err(ConfigurationError::invalid("lanes_distribution", "must be at least 1"));
        }
        Ok(())
    }
}

impl PositionResolver {
    /// Computes starting positions for `count` vehicles.
    ///
    /// Vehicles are spread over the length of the placement coordinate minus
    /// `bunching`, starting at `x0`, and are returned in order of increasing
    /// position from `x0`. Perturbed positions never fall behind the start of
    /// a placement coordinate that does not wrap. Lanes are assigned round
    /// robin, up to `lanes_distribution` or the lane count of the link.
    pub fn start_positions(
        &self,
        config: &InitialConfig,
        count: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<StartPosition<'_>>, Error> {
        config.validate()?;
        if count == 0 {
            return Ok(vec![]);
        }

        let wraps = self.closed && config.edges_distribution.is_none();
        let spans = self.placement_spans(config.edges_distribution.as_deref())?;
        let extent = if wraps {
            self.total_length
        } else {
            spans.iter().map(|s| s.interval.length()).sum()
        };

        let available = extent - config.bunching;
        let required = config.min_gap * count as f64;
        if available <= 0.0 || required > available {
            return Err(ConfigurationError::invalid(
                "bunching",
                format!(
                    "{} vehicles do not fit in the {:.2} m left of the network",
                    count,
                    available.max(0.0)
                ),
            )
            .into());
        }
        let tolerance = super::OFFSET_TOLERANCE * extent.max(1.0);
        if !wraps && (config.x0 < 0.0 || config.x0 + available > extent + tolerance) {
            return Err(ConfigurationError::invalid(
                "x0",
                format!(
                    "{:.2} m of vehicles from {} run past the end of the {:.2} m available",
                    available, config.x0, extent
                ),
            )
            .into());
        }

        let mut offsets = match config.spacing {
            Spacing::Uniform => {
                let increment = available / count as f64;
                let mut offsets = (0..count).map(|i| i as f64 * increment).collect::<Vec<_>>();
                if config.perturbation > 0.0 {
                    let distr = rand_distr::Normal::new(0.0, config.perturbation)
                        .map_err(|e| ConfigurationError::invalid("perturbation", e.to_string()))?;
                    let bound = 0.5 * increment;
                    for offset in &mut offsets {
                        *offset += distr.sample(rng).clamp(-bound, bound);
                    }
                }
                offsets
            }
            Spacing::Random => {
                let slack = available - required;
                let mut draws = (0..count).map(|_| rng.gen::<f64>() * slack).collect::<Vec<_>>();
                draws.sort_by(f64::total_cmp);
                draws
                    .into_iter()
                    .enumerate()
                    .map(|(i, draw)| draw + i as f64 * config.min_gap)
                    .collect()
            }
        };
        if !wraps {
            for offset in &mut offsets {
                *offset = offset.max(0.0);
            }
        }

        log::debug!(
            "placing {} vehicles with {:?} spacing over {:.2} m",
            count,
            config.spacing,
            available
        );

        let max_lanes = config.lanes_distribution.unwrap_or(u32::MAX);
        offsets
            .into_iter()
            .enumerate()
            .map(|(i, offset)| -> Result<_, Error> {
                let pos = config.x0 + offset;
                let location = if wraps {
                    self.locate(pos)?
                } else {
                    place(&spans, pos)?
                };
                let lanes = self.lanes_of(location.id).min(max_lanes);
                Ok(StartPosition {
                    location,
                    lane: (i % lanes as usize) as u32,
                })
            })
            .collect()
    }

    /// The links making up the placement coordinate, in order of offset.
    fn placement_spans(
        &self,
        edges: Option<&[String]>,
    ) -> Result<Vec<&Span>, ConfigurationError> {
        let Some(edges) = edges else {
            return Ok(self.spans.iter().filter(|s| s.interval.length() > 0.0).collect());
        };
        let mut spans = edges
            .iter()
            .map(|id| {
                self.index
                    .get(id.as_str())
                    .map(|idx| &self.spans[*idx])
                    .filter(|span| span.kind == LinkKind::Edge)
                    .ok_or_else(|| {
                        let reason = format!("unknown edge `{}`", id);
                        ConfigurationError::invalid("edges_distribution", reason)
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        spans.sort_by(|a, b| a.interval.min.total_cmp(&b.interval.min));
        Ok(spans)
    }

    fn lanes_of(&self, id: &str) -> u32 {
        self.index.get(id).map_or(1, |idx| self.spans[*idx].lanes)
    }
}

/// Finds the position `pos` along links laid end to end.
fn place<'a>(spans: &[&'a Span], pos: f64) -> Result<Location<'a>, QueryError> {
    let mut start = 0.0;
    for span in spans.iter().copied() {
        let length = span.interval.length();
        if pos < start + length {
            return Ok(span.location(pos - start));
        }
        start += length;
    }
    Err(QueryError::OutOfRange(pos))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scenarios::{Merge, MergeParams, Ring, RingParams};
    use crate::{LinkKind, TopologyBuilder};
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ring_resolver() -> PositionResolver {
        let ring = Ring::new(RingParams {
            radius: 50.0,
            lanes: 1,
            speed_limit: 30.0,
            resolution: 40,
        })
        .unwrap();
        let network = TopologyBuilder::new().compile(&ring).unwrap();
        PositionResolver::new(&network, &ring).unwrap()
    }

    /// A 900 m merge with a two lane highway.
    fn merge_resolver() -> PositionResolver {
        let merge = Merge::new(MergeParams {
            pre_merge_length: 500.0,
            post_merge_length: 100.0,
            merge_length: 100.0,
            highway_lanes: 2,
            merge_lanes: 1,
            speed_limit: 30.0,
        })
        .unwrap();
        let network = TopologyBuilder::new().compile(&merge).unwrap();
        PositionResolver::new(&network, &merge).unwrap()
    }

    fn global(resolver: &PositionResolver, start: &StartPosition) -> f64 {
        let location = start.location;
        resolver.global_position(location.id, location.pos).unwrap()
    }

    #[test]
    fn uniform_spacing_is_even() {
        let resolver = ring_resolver();
        let mut rng = StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        let positions = resolver
            .start_positions(&InitialConfig::default(), 10, &mut rng)
            .unwrap();
        assert_eq!(positions.len(), 10);
        let spacing = resolver.total_length() / 10.0;
        for (i, start) in positions.iter().enumerate() {
            assert_eq!(start.location.kind, LinkKind::Edge);
            assert_eq!(start.lane, 0);
            assert_approx_eq!(global(&resolver, start), i as f64 * spacing, 1e-6);
        }
    }

    #[test]
    fn perturbation_is_bounded() {
        let resolver = ring_resolver();
        let mut rng = StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        let config = InitialConfig {
            perturbation: 100.0,
            ..Default::default()
        };
        let spacing = resolver.total_length() / 8.0;
        let positions = resolver.start_positions(&config, 8, &mut rng).unwrap();
        for (i, start) in positions.iter().enumerate() {
            let expected = i as f64 * spacing;
            let offset = resolver.forward_distance(expected, global(&resolver, start));
            let offset = f64::min(offset, resolver.total_length() - offset);
            assert!(offset <= 0.5 * spacing + 1e-6);
        }
    }

    #[test]
    fn perturbed_vehicles_stay_on_open_networks() {
        let resolver = merge_resolver();
        let config = InitialConfig {
            perturbation: 5.0,
            ..Default::default()
        };
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let positions = resolver.start_positions(&config, 5, &mut rng).unwrap();
            assert_eq!(positions.len(), 5);
            for start in &positions {
                let pos = global(&resolver, start);
                assert!((0.0..resolver.total_length()).contains(&pos), "seed {}", seed);
            }
        }
    }

    #[test]
    fn open_placement_must_fit_after_x0() {
        let resolver = merge_resolver();
        let mut rng = StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        let config = InitialConfig {
            x0: 50.0,
            ..Default::default()
        };
        let result = resolver.start_positions(&config, 5, &mut rng);
        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigurationError::Invalid { key: "x0", .. }))
        ));

        // Leaving room behind the vehicles lets them start further along
        let config = InitialConfig {
            x0: 50.0,
            bunching: 60.0,
            spacing: Spacing::Random,
            ..Default::default()
        };
        let positions = resolver.start_positions(&config, 5, &mut rng).unwrap();
        assert!(positions.iter().all(|start| global(&resolver, start) >= 50.0));
    }

    #[test]
    fn random_spacing_respects_min_gap() {
        let resolver = ring_resolver();
        let mut rng = StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        let config = InitialConfig {
            spacing: Spacing::Random,
            min_gap: 10.0,
            bunching: 20.0,
            ..Default::default()
        };
        let positions = resolver.start_positions(&config, 12, &mut rng).unwrap();
        let globals = positions.iter().map(|s| global(&resolver, s)).collect::<Vec<_>>();
        for pair in globals.windows(2) {
            assert!(pair[1] - pair[0] >= 10.0 - 1e-9);
        }
        assert!(*globals.last().unwrap() < resolver.total_length() - 20.0 + 1e-9);
    }

    #[test]
    fn overfull_networks_are_rejected() {
        let resolver = ring_resolver();
        let mut rng = StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        let config = InitialConfig {
            min_gap: 100.0,
            ..Default::default()
        };
        let result = resolver.start_positions(&config, 10, &mut rng);
        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigurationError::Invalid { key: "bunching", .. }))
        ));
    }

    #[test]
    fn edges_distribution_restricts_placement() {
        let resolver = merge_resolver();
        let mut rng = StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        let config = InitialConfig {
            edges_distribution: Some(vec!["center".into(), "left".into()]),
            ..Default::default()
        };
        let positions = resolver.start_positions(&config, 12, &mut rng).unwrap();
        let ids = positions.iter().map(|s| s.location.id).collect::<Vec<_>>();
        assert!(ids.iter().all(|id| *id == "left" || *id == "center"));
        // 600 m of highway, so every 50 m in order of offset
        assert_eq!(ids[..10], ["left"; 10]);
        assert_eq!(ids[10..], ["center"; 2]);
        assert_approx_eq!(positions[11].location.pos, 50.0, 1e-9);

        // The distribution does not wrap even on closed networks
        let resolver = ring_resolver();
        let config = InitialConfig {
            x0: 10.0,
            edges_distribution: Some(vec!["top".into()]),
            ..Default::default()
        };
        let result = resolver.start_positions(&config, 3, &mut rng);
        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigurationError::Invalid { key: "x0", .. }))
        ));
    }

    #[test]
    fn unknown_distribution_edges_are_rejected() {
        let resolver = merge_resolver();
        let mut rng = StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        for id in ["shoulder", ":center_0"] {
            let config = InitialConfig {
                edges_distribution: Some(vec!["left".into(), id.into()]),
                ..Default::default()
            };
            let result = resolver.start_positions(&config, 2, &mut rng);
            assert!(matches!(
                result,
                Err(Error::Configuration(ConfigurationError::Invalid {
                    key: "edges_distribution",
                    ..
                }))
            ));
        }
    }

    #[test]
    fn lanes_are_assigned_round_robin() {
        let resolver = merge_resolver();
        let mut rng = StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        let config = InitialConfig {
            edges_distribution: Some(vec!["left".into()]),
            ..Default::default()
        };
        let positions = resolver.start_positions(&config, 5, &mut rng).unwrap();
        let lanes = positions.iter().map(|s| s.lane).collect::<Vec<_>>();
        assert_eq!(lanes, [0, 1, 0, 1, 0]);

        let config = InitialConfig {
            lanes_distribution: Some(1),
            ..config
        };
        let positions = resolver.start_positions(&config, 5, &mut rng).unwrap();
        assert!(positions.iter().all(|s| s.lane == 0));

        // Single lane links cap the assignment
        let config = InitialConfig {
            edges_distribution: Some(vec!["inflow_merge".into(), "bottom".into()]),
            lanes_distribution: Some(4),
            ..Default::default()
        };
        let positions = resolver.start_positions(&config, 4, &mut rng).unwrap();
        assert!(positions.iter().all(|s| s.lane == 0));
    }

    #[test]
    fn config_parses_from_json() {
        let config = InitialConfig::from_json(r#"{"spacing": "random", "min_gap": 5}"#).unwrap();
        assert_eq!(config.spacing, Spacing::Random);
        assert_approx_eq!(config.min_gap, 5.0);
        assert_approx_eq!(config.x0, 0.0);
        assert_eq!(config.edges_distribution, None);
        assert_eq!(config.lanes_distribution, None);

        let json = r#"{"edges_distribution": ["2", "3", "4", "5"], "lanes_distribution": 2}"#;
        let config = InitialConfig::from_json(json).unwrap();
        assert_eq!(config.edges_distribution.unwrap().len(), 4);
        assert_eq!(config.lanes_distribution, Some(2));

        assert!(InitialConfig::from_json(r#"{"perturbation": -1}"#).is_err());
        assert!(InitialConfig::from_json(r#"{"spacing": "sideways"}"#).is_err());
        assert!(InitialConfig::from_json(r#"{"headway": 3}"#).is_err());
        assert!(InitialConfig::from_json(r#"{"lanes_distribution": 0}"#).is_err());
        assert!(InitialConfig::from_json(r#"{"edges_distribution": []}"#).is_err());
        assert!(InitialConfig::from_json(r#"{"edges_distribution": ["a", "a"]}"#).is_err());
    }
}
