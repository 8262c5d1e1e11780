//! Density-based clustering (DBSCAN)
//!
//! Used to find specks that belong together, rows of similar height and
//! the margins of a column of text. Points are small fixed-size vectors
//! compared by euclidean distance.

/// Cluster points with DBSCAN
///
/// A point is a core point when at least `min_points` points (itself
/// included) lie within `eps` of it. Clusters grow from core points
/// through their neighbourhoods. Points reachable from no core point are
/// noise: with `include_noise` each becomes a cluster of its own,
/// otherwise they are dropped.
///
/// Returns clusters as lists of indices into `points`. Clusters appear in
/// the order of their first point; indices within a cluster are sorted.
///
/// # Example
///
/// ```
/// use pageseg_core::cluster::dbscan;
///
/// let points = [[0.0], [1.0], [2.0], [50.0]];
/// let clusters = dbscan(&points, 1.5, 2, true);
/// assert_eq!(clusters, vec![vec![0, 1, 2], vec![3]]);
/// ```
pub fn dbscan<const D: usize>(
    points: &[[f64; D]],
    eps: f64,
    min_points: usize,
    include_noise: bool,
) -> Vec<Vec<usize>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Label {
        Unvisited,
        Noise,
        Cluster(usize),
    }

    let n = points.len();
    let mut labels = vec![Label::Unvisited; n];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    let neighbours = |i: usize| -> Vec<usize> {
        (0..n)
            .filter(|&j| distance(&points[i], &points[j]) <= eps)
            .collect()
    };

    for i in 0..n {
        if labels[i] != Label::Unvisited {
            continue;
        }
        let seeds = neighbours(i);
        if seeds.len() < min_points {
            labels[i] = Label::Noise;
            continue;
        }

        let cluster_id = clusters.len();
        let mut members = vec![i];
        labels[i] = Label::Cluster(cluster_id);

        let mut queue = seeds;
        let mut head = 0;
        while head < queue.len() {
            let j = queue[head];
            head += 1;
            match labels[j] {
                Label::Cluster(_) => continue,
                Label::Noise => {
                    // border point
                    labels[j] = Label::Cluster(cluster_id);
                    members.push(j);
                }
                Label::Unvisited => {
                    labels[j] = Label::Cluster(cluster_id);
                    members.push(j);
                    let expansion = neighbours(j);
                    if expansion.len() >= min_points {
                        queue.extend(expansion);
                    }
                }
            }
        }
        members.sort_unstable();
        clusters.push(members);
    }

    if include_noise {
        let mut with_noise: Vec<(usize, Vec<usize>)> = clusters
            .into_iter()
            .map(|c| (c[0], c))
            .collect();
        for (i, label) in labels.iter().enumerate() {
            if *label == Label::Noise {
                with_noise.push((i, vec![i]));
            }
        }
        with_noise.sort_by_key(|(first, _)| *first);
        return with_noise.into_iter().map(|(_, c)| c).collect();
    }
    clusters
}

/// Sort clusters by descending size, keeping the input order among equals
pub fn by_descending_size(mut clusters: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
    clusters.sort_by(|a, b| b.len().cmp(&a.len()));
    clusters
}

#[inline]
fn distance<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
