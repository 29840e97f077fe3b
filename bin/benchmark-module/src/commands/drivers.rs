// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `benchmark-module drivers`: list HAL drivers and their availability.

pub fn execute() -> anyhow::Result<()> {
    println!("  {:<12} {:<10} {}", "Driver", "Status", "Description");
    println!("  {}", "-".repeat(72));
    for driver in hal::available_drivers() {
        let status = if driver.available { "available" } else { "missing" };
        println!("  {:<12} {:<10} {}", driver.name, status, driver.description);
    }
    Ok(())
}
