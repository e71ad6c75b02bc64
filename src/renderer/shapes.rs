//! Shape generation for 2D primitives

use glam::Vec2;
use std::f32::consts::{PI, TAU};

use super::vertex::Vertex;

/// Segment count that keeps a circle of this radius looking round
pub fn segments_for(radius: f32) -> u32 {
    (radius * 1.5).clamp(12.0, 64.0) as u32
}

/// Point on a circle
fn on_circle(center: Vec2, radius: f32, theta: f32) -> Vec2 {
    center + Vec2::from_angle(theta) * radius
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;
        let edge1 = on_circle(center, radius, theta1);
        let edge2 = on_circle(center, radius, theta2);

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(edge1.x, edge1.y, color));
        vertices.push(Vertex::new(edge2.x, edge2.y, color));
    }

    vertices
}

/// One quad of a band between two radii, `theta1..theta2`
fn band_quad(
    vertices: &mut Vec<Vertex>,
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    theta1: f32,
    theta2: f32,
    color: [f32; 4],
) {
    let inner1 = on_circle(center, inner_radius, theta1);
    let outer1 = on_circle(center, outer_radius, theta1);
    let inner2 = on_circle(center, inner_radius, theta2);
    let outer2 = on_circle(center, outer_radius, theta2);

    // Two triangles per segment
    vertices.push(Vertex::new(inner1.x, inner1.y, color));
    vertices.push(Vertex::new(outer1.x, outer1.y, color));
    vertices.push(Vertex::new(inner2.x, inner2.y, color));

    vertices.push(Vertex::new(inner2.x, inner2.y, color));
    vertices.push(Vertex::new(outer1.x, outer1.y, color));
    vertices.push(Vertex::new(outer2.x, outer2.y, color));
}

/// Generate vertices for a ring (hollow circle)
pub fn ring(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;
        band_quad(
            &mut vertices,
            center,
            inner_radius,
            outer_radius,
            theta1,
            theta2,
            color,
        );
    }

    vertices
}

/// Stroke of `width` centered on `radius`, as a ring
pub fn stroke(center: Vec2, radius: f32, width: f32, color: [f32; 4]) -> Vec<Vertex> {
    let half = width / 2.0;
    ring(
        center,
        (radius - half).max(0.0),
        radius + half,
        color,
        segments_for(radius),
    )
}

/// Dashed stroke: `dash` on, `gap` off, measured along the circumference
pub fn dashed_ring(
    center: Vec2,
    radius: f32,
    width: f32,
    dash: f32,
    gap: f32,
    color: [f32; 4],
) -> Vec<Vertex> {
    let circumference = TAU * radius;
    let period = dash + gap;
    if radius <= 0.0 || dash <= 0.0 || period <= 0.0 {
        return Vec::new();
    }

    let half = width / 2.0;
    let inner = (radius - half).max(0.0);
    let outer = radius + half;
    let dash_count = (circumference / period).ceil() as u32;
    let mut vertices = Vec::with_capacity((dash_count * 6) as usize);

    for i in 0..dash_count {
        let start = i as f32 * period;
        let end = (start + dash).min(circumference);
        if end <= start {
            break;
        }
        band_quad(
            &mut vertices,
            center,
            inner,
            outer,
            start / radius,
            end / radius,
            color,
        );
    }

    vertices
}
