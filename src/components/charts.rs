//! Horizontal bar charts for count breakdowns.

use std::collections::HashMap;

use leptos::prelude::*;

use super::format::key_color;

/// One bar: label, count and width as a percentage of the largest count.
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
	/// Map key.
	pub label: String,
	/// Map value.
	pub count: u64,
	/// Percentage of the largest count.
	pub width: f64,
}

/// Orders counts descending, ties by label, and keeps at most `limit` bars.
pub fn bar_widths(counts: &HashMap<String, u64>, limit: usize) -> Vec<Bar> {
	let mut entries: Vec<(&String, &u64)> = counts.iter().collect();
	entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
	entries.truncate(limit);

	let max = entries.first().map_or(0, |&(_, &c)| c);
	entries
		.into_iter()
		.map(|(label, &count)| Bar {
			label: label.clone(),
			count,
			width: if max == 0 {
				0.0
			} else {
				count as f64 / max as f64 * 100.0
			},
		})
		.collect()
}

/// Bar chart of a stats map. Bars are coloured by key when the key is a
/// severity or drift type.
#[component]
pub fn BarChart(
	title: &'static str,
	#[prop(into)] counts: Signal<HashMap<String, u64>>,
	#[prop(default = usize::MAX)] limit: usize,
) -> impl IntoView {
	let bars = move || bar_widths(&counts.get(), limit);

	view! {
		<section class="bar-chart">
			<h3>{title}</h3>
			<Show when=move || !bars().is_empty() fallback=|| view! { <p class="empty">"No data"</p> }>
				<ul>
					<For each=bars key=|bar| bar.label.clone() let:bar>
						<li class="bar-row">
							<span class="bar-label">{bar.label.clone()}</span>
							<span class="bar-track">
								<span
									class="bar-fill"
									style:width=format!("{:.1}%", bar.width)
									style:background-color=key_color(&bar.label)
								></span>
							</span>
							<span class="bar-count">{bar.count}</span>
						</li>
					</For>
				</ul>
			</Show>
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn counts(entries: &[(&str, u64)]) -> HashMap<String, u64> {
		entries.iter().map(|&(k, v)| (k.to_string(), v)).collect()
	}

	#[test]
	fn bars_are_sorted_and_scaled_to_the_largest() {
		let bars = bar_widths(&counts(&[("low", 5), ("critical", 10), ("high", 5)]), 8);
		let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
		assert_eq!(labels, vec!["critical", "high", "low"]);
		assert_eq!(bars[0].width, 100.0);
		assert_eq!(bars[1].width, 50.0);
	}

	#[test]
	fn limit_keeps_the_top_entries() {
		let map = counts(&[("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
		let bars = bar_widths(&map, 2);
		assert_eq!(bars.len(), 2);
		assert_eq!(bars[0].label, "d");
		assert_eq!(bars[1].label, "c");
	}

	#[test]
	fn all_zero_counts_have_zero_width() {
		let bars = bar_widths(&counts(&[("a", 0)]), 8);
		assert_eq!(bars[0].width, 0.0);
		assert!(bar_widths(&HashMap::new(), 8).is_empty());
	}
}
