//! Canonical programs, one per language per algorithm

use tacgraph_ir::LanguageId;

#[derive(Debug, Clone, Copy)]
pub struct Program {
    pub language: LanguageId,
    pub name: &'static str,
    pub source: &'static str,
}

const fn program(language: LanguageId, name: &'static str, source: &'static str) -> Program {
    Program {
        language,
        name,
        source,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// GCD (the cross-language program)
// ═══════════════════════════════════════════════════════════════════════════

pub static GCD: [Program; 15] = [
    program(
        LanguageId::Python,
        "gcd",
        r#"def gcd(a, b):
    while b != 0:
        t = b
        b = a % b
        a = t
    return a

print(gcd(48, 18))
"#,
    ),
    program(
        LanguageId::JavaScript,
        "gcd",
        r#"function gcd(a, b) {
  while (b !== 0) {
    const t = b;
    b = a % b;
    a = t;
  }
  return a;
}

console.log(gcd(48, 18));
"#,
    ),
    program(
        LanguageId::TypeScript,
        "gcd",
        r#"function gcd(a: number, b: number): number {
  while (b !== 0) {
    const t: number = b;
    b = a % b;
    a = t;
  }
  return a;
}

console.log(gcd(48, 18));
"#,
    ),
    program(
        LanguageId::Java,
        "gcd",
        r#"public class Main {
    static int gcd(int a, int b) {
        while (b != 0) {
            int t = b;
            b = a % b;
            a = t;
        }
        return a;
    }

    public static void main(String[] args) {
        System.out.println(gcd(48, 18));
    }
}
"#,
    ),
    program(
        LanguageId::Ruby,
        "gcd",
        r#"def gcd(a, b)
  while b != 0
    t = b
    b = a % b
    a = t
  end
  return a
end

puts(gcd(48, 18))
"#,
    ),
    program(
        LanguageId::Go,
        "gcd",
        r#"package main

import "fmt"

func gcd(a int, b int) int {
	for b != 0 {
		t := b
		b = a % b
		a = t
	}
	return a
}

func main() {
	fmt.Println(gcd(48, 18))
}
"#,
    ),
    program(
        LanguageId::Php,
        "gcd",
        r#"<?php
function gcd($a, $b) {
    while ($b != 0) {
        $t = $b;
        $b = $a % $b;
        $a = $t;
    }
    return $a;
}

echo gcd(48, 18);
"#,
    ),
    program(
        LanguageId::CSharp,
        "gcd",
        r#"using System;

class Program {
    static int Gcd(int a, int b) {
        while (b != 0) {
            int t = b;
            b = a % b;
            a = t;
        }
        return a;
    }

    static void Main() {
        Console.WriteLine(Gcd(48, 18));
    }
}
"#,
    ),
    program(
        LanguageId::C,
        "gcd",
        r#"#include <stdio.h>

int gcd(int a, int b) {
    while (b != 0) {
        int t = b;
        b = a % b;
        a = t;
    }
    return a;
}

int main() {
    printf("%d\n", gcd(48, 18));
    return 0;
}
"#,
    ),
    program(
        LanguageId::Cpp,
        "gcd",
        r#"#include <cstdio>

int gcd(int a, int b) {
    while (b != 0) {
        int t = b;
        b = a % b;
        a = t;
    }
    return a;
}

int main() {
    printf("%d\n", gcd(48, 18));
    return 0;
}
"#,
    ),
    program(
        LanguageId::Rust,
        "gcd",
        r#"fn gcd(a: u64, b: u64) -> u64 {
    let mut x = a;
    let mut y = b;
    while y != 0 {
        let t = y;
        y = x % y;
        x = t;
    }
    x
}

fn main() {
    println!("{}", gcd(48, 18));
}
"#,
    ),
    program(
        LanguageId::Kotlin,
        "gcd",
        r#"fun gcd(a: Int, b: Int): Int {
    var x = a
    var y = b
    while (y != 0) {
        val t = y
        y = x % y
        x = t
    }
    return x
}

fun main() {
    println(gcd(48, 18))
}
"#,
    ),
    program(
        LanguageId::Scala,
        "gcd",
        r#"object Main {
  def gcd(a: Int, b: Int): Int = {
    var x = a
    var y = b
    while (y != 0) {
      val t = y
      y = x % y
      x = t
    }
    x
  }

  def main(args: Array[String]): Unit = {
    println(gcd(48, 18))
  }
}
"#,
    ),
    program(
        LanguageId::Lua,
        "gcd",
        r#"local function gcd(a, b)
  while b ~= 0 do
    local t = b
    b = a % b
    a = t
  end
  return a
end

print(gcd(48, 18))
"#,
    ),
    program(
        LanguageId::Pascal,
        "gcd",
        r#"program GcdDemo;

function Gcd(a, b: Integer): Integer;
var
  t: Integer;
begin
  while b <> 0 do
  begin
    t := b;
    b := a mod b;
    a := t;
  end;
  Gcd := a;
end;

begin
  WriteLn(Gcd(48, 18));
end.
"#,
    ),
];

// ═══════════════════════════════════════════════════════════════════════════
// Factorial (recursion + conditional)
// ═══════════════════════════════════════════════════════════════════════════

pub static FACTORIAL: [Program; 15] = [
    program(
        LanguageId::Python,
        "factorial",
        r#"def factorial(n):
    if n <= 1:
        return 1
    return n * factorial(n - 1)

result = factorial(5)
"#,
    ),
    program(
        LanguageId::JavaScript,
        "factorial",
        r#"function factorial(n) {
  if (n <= 1) {
    return 1;
  }
  return n * factorial(n - 1);
}

const result = factorial(5);
"#,
    ),
    program(
        LanguageId::TypeScript,
        "factorial",
        r#"function factorial(n: number): number {
  if (n <= 1) {
    return 1;
  }
  return n * factorial(n - 1);
}

const result: number = factorial(5);
"#,
    ),
    program(
        LanguageId::Java,
        "factorial",
        r#"public class Main {
    static int factorial(int n) {
        if (n <= 1) {
            return 1;
        }
        return n * factorial(n - 1);
    }

    public static void main(String[] args) {
        int result = factorial(5);
    }
}
"#,
    ),
    program(
        LanguageId::Ruby,
        "factorial",
        r#"def factorial(n)
  if n <= 1
    return 1
  end
  return n * factorial(n - 1)
end

result = factorial(5)
"#,
    ),
    program(
        LanguageId::Go,
        "factorial",
        r#"package main

func factorial(n int) int {
	if n <= 1 {
		return 1
	}
	return n * factorial(n-1)
}

func main() {
	result := factorial(5)
	println(result)
}
"#,
    ),
    program(
        LanguageId::Php,
        "factorial",
        r#"<?php
function factorial($n) {
    if ($n <= 1) {
        return 1;
    }
    return $n * factorial($n - 1);
}

$result = factorial(5);
"#,
    ),
    program(
        LanguageId::CSharp,
        "factorial",
        r#"class Program {
    static int Factorial(int n) {
        if (n <= 1) {
            return 1;
        }
        return n * Factorial(n - 1);
    }

    static void Main() {
        int result = Factorial(5);
    }
}
"#,
    ),
    program(
        LanguageId::C,
        "factorial",
        r#"int factorial(int n) {
    if (n <= 1) {
        return 1;
    }
    return n * factorial(n - 1);
}

int main() {
    int result = factorial(5);
    return 0;
}
"#,
    ),
    program(
        LanguageId::Cpp,
        "factorial",
        r#"int factorial(int n) {
    if (n <= 1) {
        return 1;
    }
    return n * factorial(n - 1);
}

int main() {
    int result = factorial(5);
    return 0;
}
"#,
    ),
    program(
        LanguageId::Rust,
        "factorial",
        r#"fn factorial(n: u64) -> u64 {
    if n <= 1 {
        return 1;
    }
    n * factorial(n - 1)
}

fn main() {
    let result = factorial(5);
}
"#,
    ),
    program(
        LanguageId::Kotlin,
        "factorial",
        r#"fun factorial(n: Int): Int {
    if (n <= 1) {
        return 1
    }
    return n * factorial(n - 1)
}

fun main() {
    val result = factorial(5)
}
"#,
    ),
    program(
        LanguageId::Scala,
        "factorial",
        r#"object Main {
  def factorial(n: Int): Int = {
    if (n <= 1) 1 else n * factorial(n - 1)
  }

  def main(args: Array[String]): Unit = {
    val result = factorial(5)
  }
}
"#,
    ),
    program(
        LanguageId::Lua,
        "factorial",
        r#"local function factorial(n)
  if n <= 1 then
    return 1
  end
  return n * factorial(n - 1)
end

local result = factorial(5)
"#,
    ),
    program(
        LanguageId::Pascal,
        "factorial",
        r#"program FactorialDemo;

function Factorial(n: Integer): Integer;
begin
  if n <= 1 then
    Factorial := 1
  else
    Factorial := n * Factorial(n - 1);
end;

begin
  WriteLn(Factorial(5));
end.
"#,
    ),
];

// ═══════════════════════════════════════════════════════════════════════════
// FizzBuzz (loop + modulo + else-if chain)
// ═══════════════════════════════════════════════════════════════════════════

pub static FIZZBUZZ: [Program; 15] = [
    program(
        LanguageId::Python,
        "fizzbuzz",
        r#"for i in range(1, 16):
    if i % 15 == 0:
        print("FizzBuzz")
    elif i % 3 == 0:
        print("Fizz")
    elif i % 5 == 0:
        print("Buzz")
    else:
        print(i)
"#,
    ),
    program(
        LanguageId::JavaScript,
        "fizzbuzz",
        r#"for (let i = 1; i <= 15; i++) {
  if (i % 15 === 0) {
    console.log("FizzBuzz");
  } else if (i % 3 === 0) {
    console.log("Fizz");
  } else if (i % 5 === 0) {
    console.log("Buzz");
  } else {
    console.log(i);
  }
}
"#,
    ),
    program(
        LanguageId::TypeScript,
        "fizzbuzz",
        r#"for (let i: number = 1; i <= 15; i++) {
  if (i % 15 === 0) {
    console.log("FizzBuzz");
  } else if (i % 3 === 0) {
    console.log("Fizz");
  } else if (i % 5 === 0) {
    console.log("Buzz");
  } else {
    console.log(i);
  }
}
"#,
    ),
    program(
        LanguageId::Java,
        "fizzbuzz",
        r#"public class Main {
    public static void main(String[] args) {
        for (int i = 1; i <= 15; i++) {
            if (i % 15 == 0) {
                System.out.println("FizzBuzz");
            } else if (i % 3 == 0) {
                System.out.println("Fizz");
            } else if (i % 5 == 0) {
                System.out.println("Buzz");
            } else {
                System.out.println(i);
            }
        }
    }
}
"#,
    ),
    program(
        LanguageId::Ruby,
        "fizzbuzz",
        r#"for i in 1..15
  if i % 15 == 0
    puts("FizzBuzz")
  elsif i % 3 == 0
    puts("Fizz")
  elsif i % 5 == 0
    puts("Buzz")
  else
    puts(i)
  end
end
"#,
    ),
    program(
        LanguageId::Go,
        "fizzbuzz",
        r#"package main

import "fmt"

func main() {
	for i := 1; i <= 15; i++ {
		if i%15 == 0 {
			fmt.Println("FizzBuzz")
		} else if i%3 == 0 {
			fmt.Println("Fizz")
		} else if i%5 == 0 {
			fmt.Println("Buzz")
		} else {
			fmt.Println(i)
		}
	}
}
"#,
    ),
    program(
        LanguageId::Php,
        "fizzbuzz",
        r#"<?php
for ($i = 1; $i <= 15; $i++) {
    if ($i % 15 == 0) {
        echo "FizzBuzz";
    } elseif ($i % 3 == 0) {
        echo "Fizz";
    } elseif ($i % 5 == 0) {
        echo "Buzz";
    } else {
        echo $i;
    }
}
"#,
    ),
    program(
        LanguageId::CSharp,
        "fizzbuzz",
        r#"for (int i = 1; i <= 15; i++) {
    if (i % 15 == 0) {
        Console.WriteLine("FizzBuzz");
    } else if (i % 3 == 0) {
        Console.WriteLine("Fizz");
    } else if (i % 5 == 0) {
        Console.WriteLine("Buzz");
    } else {
        Console.WriteLine(i);
    }
}
"#,
    ),
    program(
        LanguageId::C,
        "fizzbuzz",
        r#"int main() {
    for (int i = 1; i <= 15; i++) {
        if (i % 15 == 0) {
            printf("FizzBuzz\n");
        } else if (i % 3 == 0) {
            printf("Fizz\n");
        } else if (i % 5 == 0) {
            printf("Buzz\n");
        } else {
            printf("%d\n", i);
        }
    }
    return 0;
}
"#,
    ),
    program(
        LanguageId::Cpp,
        "fizzbuzz",
        r#"int main() {
    for (int i = 1; i <= 15; i++) {
        if (i % 15 == 0) {
            printf("FizzBuzz\n");
        } else if (i % 3 == 0) {
            printf("Fizz\n");
        } else if (i % 5 == 0) {
            printf("Buzz\n");
        } else {
            printf("%d\n", i);
        }
    }
    return 0;
}
"#,
    ),
    program(
        LanguageId::Rust,
        "fizzbuzz",
        r#"fn main() {
    for i in 1..=15 {
        if i % 15 == 0 {
            println!("FizzBuzz");
        } else if i % 3 == 0 {
            println!("Fizz");
        } else if i % 5 == 0 {
            println!("Buzz");
        } else {
            println!("{}", i);
        }
    }
}
"#,
    ),
    program(
        LanguageId::Kotlin,
        "fizzbuzz",
        r#"fun main() {
    for (i in 1..15) {
        if (i % 15 == 0) {
            println("FizzBuzz")
        } else if (i % 3 == 0) {
            println("Fizz")
        } else if (i % 5 == 0) {
            println("Buzz")
        } else {
            println(i)
        }
    }
}
"#,
    ),
    program(
        LanguageId::Scala,
        "fizzbuzz",
        r#"object Main {
  def main(args: Array[String]): Unit = {
    for (i <- 1 to 15) {
      if (i % 15 == 0) println("FizzBuzz")
      else if (i % 3 == 0) println("Fizz")
      else if (i % 5 == 0) println("Buzz")
      else println(i)
    }
  }
}
"#,
    ),
    program(
        LanguageId::Lua,
        "fizzbuzz",
        r#"for i = 1, 15 do
  if i % 15 == 0 then
    print("FizzBuzz")
  elseif i % 3 == 0 then
    print("Fizz")
  elseif i % 5 == 0 then
    print("Buzz")
  else
    print(i)
  end
end
"#,
    ),
    program(
        LanguageId::Pascal,
        "fizzbuzz",
        r#"program FizzBuzz;
var
  i: Integer;
begin
  for i := 1 to 15 do
  begin
    if i mod 15 = 0 then
      WriteLn('FizzBuzz')
    else if i mod 3 = 0 then
      WriteLn('Fizz')
    else if i mod 5 = 0 then
      WriteLn('Buzz')
    else
      WriteLn(i);
  end;
end.
"#,
    ),
];

// ═══════════════════════════════════════════════════════════════════════════
// Bubble sort (nested loops + indexed reads and writes)
// ═══════════════════════════════════════════════════════════════════════════

pub static BUBBLE_SORT: [Program; 15] = [
    program(
        LanguageId::Python,
        "bubble_sort",
        r#"def bubble_sort(a, n):
    i = 0
    while i < n:
        j = 0
        while j < n - i - 1:
            if a[j] > a[j + 1]:
                t = a[j]
                a[j] = a[j + 1]
                a[j + 1] = t
            j = j + 1
        i = i + 1
    return a
"#,
    ),
    program(
        LanguageId::JavaScript,
        "bubble_sort",
        r#"function bubbleSort(a, n) {
  let i = 0;
  while (i < n) {
    let j = 0;
    while (j < n - i - 1) {
      if (a[j] > a[j + 1]) {
        const t = a[j];
        a[j] = a[j + 1];
        a[j + 1] = t;
      }
      j = j + 1;
    }
    i = i + 1;
  }
  return a;
}
"#,
    ),
    program(
        LanguageId::TypeScript,
        "bubble_sort",
        r#"function bubbleSort(a: number[], n: number): number[] {
  let i: number = 0;
  while (i < n) {
    let j: number = 0;
    while (j < n - i - 1) {
      if (a[j] > a[j + 1]) {
        const t: number = a[j];
        a[j] = a[j + 1];
        a[j + 1] = t;
      }
      j = j + 1;
    }
    i = i + 1;
  }
  return a;
}
"#,
    ),
    program(
        LanguageId::Java,
        "bubble_sort",
        r#"public class Main {
    static int[] bubbleSort(int[] a, int n) {
        int i = 0;
        while (i < n) {
            int j = 0;
            while (j < n - i - 1) {
                if (a[j] > a[j + 1]) {
                    int t = a[j];
                    a[j] = a[j + 1];
                    a[j + 1] = t;
                }
                j = j + 1;
            }
            i = i + 1;
        }
        return a;
    }
}
"#,
    ),
    program(
        LanguageId::Ruby,
        "bubble_sort",
        r#"def bubble_sort(a, n)
  i = 0
  while i < n
    j = 0
    while j < n - i - 1
      if a[j] > a[j + 1]
        t = a[j]
        a[j] = a[j + 1]
        a[j + 1] = t
      end
      j = j + 1
    end
    i = i + 1
  end
  return a
end
"#,
    ),
    program(
        LanguageId::Go,
        "bubble_sort",
        r#"package main

func bubbleSort(a []int, n int) []int {
	i := 0
	for i < n {
		j := 0
		for j < n-i-1 {
			if a[j] > a[j+1] {
				t := a[j]
				a[j] = a[j+1]
				a[j+1] = t
			}
			j = j + 1
		}
		i = i + 1
	}
	return a
}
"#,
    ),
    program(
        LanguageId::Php,
        "bubble_sort",
        r#"<?php
function bubbleSort($a, $n) {
    $i = 0;
    while ($i < $n) {
        $j = 0;
        while ($j < $n - $i - 1) {
            if ($a[$j] > $a[$j + 1]) {
                $t = $a[$j];
                $a[$j] = $a[$j + 1];
                $a[$j + 1] = $t;
            }
            $j = $j + 1;
        }
        $i = $i + 1;
    }
    return $a;
}
"#,
    ),
    program(
        LanguageId::CSharp,
        "bubble_sort",
        r#"class Program {
    static int[] BubbleSort(int[] a, int n) {
        int i = 0;
        while (i < n) {
            int j = 0;
            while (j < n - i - 1) {
                if (a[j] > a[j + 1]) {
                    int t = a[j];
                    a[j] = a[j + 1];
                    a[j + 1] = t;
                }
                j = j + 1;
            }
            i = i + 1;
        }
        return a;
    }
}
"#,
    ),
    program(
        LanguageId::C,
        "bubble_sort",
        r#"void bubble_sort(int a[], int n) {
    int i = 0;
    while (i < n) {
        int j = 0;
        while (j < n - i - 1) {
            if (a[j] > a[j + 1]) {
                int t = a[j];
                a[j] = a[j + 1];
                a[j + 1] = t;
            }
            j = j + 1;
        }
        i = i + 1;
    }
}
"#,
    ),
    program(
        LanguageId::Cpp,
        "bubble_sort",
        r#"void bubble_sort(int a[], int n) {
    int i = 0;
    while (i < n) {
        int j = 0;
        while (j < n - i - 1) {
            if (a[j] > a[j + 1]) {
                int t = a[j];
                a[j] = a[j + 1];
                a[j + 1] = t;
            }
            j = j + 1;
        }
        i = i + 1;
    }
}
"#,
    ),
    program(
        LanguageId::Rust,
        "bubble_sort",
        r#"fn bubble_sort(a: &mut [i32], n: usize) {
    let mut i = 0;
    while i < n {
        let mut j = 0;
        while j < n - i - 1 {
            if a[j] > a[j + 1] {
                let t = a[j];
                a[j] = a[j + 1];
                a[j + 1] = t;
            }
            j = j + 1;
        }
        i = i + 1;
    }
}
"#,
    ),
    program(
        LanguageId::Kotlin,
        "bubble_sort",
        r#"fun bubbleSort(a: IntArray, n: Int): IntArray {
    var i = 0
    while (i < n) {
        var j = 0
        while (j < n - i - 1) {
            if (a[j] > a[j + 1]) {
                val t = a[j]
                a[j] = a[j + 1]
                a[j + 1] = t
            }
            j = j + 1
        }
        i = i + 1
    }
    return a
}
"#,
    ),
    program(
        LanguageId::Scala,
        "bubble_sort",
        r#"object Main {
  def bubbleSort(a: Array[Int], n: Int): Array[Int] = {
    var i = 0
    while (i < n) {
      var j = 0
      while (j < n - i - 1) {
        if (a(j) > a(j + 1)) {
          val t = a(j)
          a(j) = a(j + 1)
          a(j + 1) = t
        }
        j = j + 1
      }
      i = i + 1
    }
    a
  }
}
"#,
    ),
    program(
        LanguageId::Lua,
        "bubble_sort",
        r#"local function bubble_sort(a, n)
  local i = 1
  while i <= n do
    local j = 1
    while j <= n - i do
      if a[j] > a[j + 1] then
        local t = a[j]
        a[j] = a[j + 1]
        a[j + 1] = t
      end
      j = j + 1
    end
    i = i + 1
  end
  return a
end
"#,
    ),
    program(
        LanguageId::Pascal,
        "bubble_sort",
        r#"program BubbleSortDemo;

procedure BubbleSort(var a: array of Integer; n: Integer);
var
  i, j, t: Integer;
begin
  i := 0;
  while i < n do
  begin
    j := 0;
    while j < n - i - 1 do
    begin
      if a[j] > a[j + 1] then
      begin
        t := a[j];
        a[j] := a[j + 1];
        a[j + 1] := t;
      end;
      j := j + 1;
    end;
    i := i + 1;
  end;
end;

begin
end.
"#,
    ),
];

// ═══════════════════════════════════════════════════════════════════════════
// Fibonacci (double recursion)
// ═══════════════════════════════════════════════════════════════════════════

pub static FIBONACCI: [Program; 15] = [
    program(
        LanguageId::Python,
        "fibonacci",
        r#"def fibonacci(n):
    if n < 2:
        return n
    return fibonacci(n - 1) + fibonacci(n - 2)

result = fibonacci(10)
"#,
    ),
    program(
        LanguageId::JavaScript,
        "fibonacci",
        r#"function fibonacci(n) {
  if (n < 2) {
    return n;
  }
  return fibonacci(n - 1) + fibonacci(n - 2);
}

const result = fibonacci(10);
"#,
    ),
    program(
        LanguageId::TypeScript,
        "fibonacci",
        r#"function fibonacci(n: number): number {
  if (n < 2) {
    return n;
  }
  return fibonacci(n - 1) + fibonacci(n - 2);
}

const result: number = fibonacci(10);
"#,
    ),
    program(
        LanguageId::Java,
        "fibonacci",
        r#"public class Main {
    static int fibonacci(int n) {
        if (n < 2) {
            return n;
        }
        return fibonacci(n - 1) + fibonacci(n - 2);
    }

    public static void main(String[] args) {
        int result = fibonacci(10);
    }
}
"#,
    ),
    program(
        LanguageId::Ruby,
        "fibonacci",
        r#"def fibonacci(n)
  if n < 2
    return n
  end
  return fibonacci(n - 1) + fibonacci(n - 2)
end

result = fibonacci(10)
"#,
    ),
    program(
        LanguageId::Go,
        "fibonacci",
        r#"package main

func fibonacci(n int) int {
	if n < 2 {
		return n
	}
	return fibonacci(n-1) + fibonacci(n-2)
}

func main() {
	result := fibonacci(10)
	println(result)
}
"#,
    ),
    program(
        LanguageId::Php,
        "fibonacci",
        r#"<?php
function fibonacci($n) {
    if ($n < 2) {
        return $n;
    }
    return fibonacci($n - 1) + fibonacci($n - 2);
}

$result = fibonacci(10);
"#,
    ),
    program(
        LanguageId::CSharp,
        "fibonacci",
        r#"class Program {
    static int Fibonacci(int n) {
        if (n < 2) {
            return n;
        }
        return Fibonacci(n - 1) + Fibonacci(n - 2);
    }

    static void Main() {
        int result = Fibonacci(10);
    }
}
"#,
    ),
    program(
        LanguageId::C,
        "fibonacci",
        r#"int fibonacci(int n) {
    if (n < 2) {
        return n;
    }
    return fibonacci(n - 1) + fibonacci(n - 2);
}

int main() {
    int result = fibonacci(10);
    return 0;
}
"#,
    ),
    program(
        LanguageId::Cpp,
        "fibonacci",
        r#"int fibonacci(int n) {
    if (n < 2) {
        return n;
    }
    return fibonacci(n - 1) + fibonacci(n - 2);
}

int main() {
    int result = fibonacci(10);
    return 0;
}
"#,
    ),
    program(
        LanguageId::Rust,
        "fibonacci",
        r#"fn fibonacci(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    fibonacci(n - 1) + fibonacci(n - 2)
}

fn main() {
    let result = fibonacci(10);
}
"#,
    ),
    program(
        LanguageId::Kotlin,
        "fibonacci",
        r#"fun fibonacci(n: Int): Int {
    if (n < 2) {
        return n
    }
    return fibonacci(n - 1) + fibonacci(n - 2)
}

fun main() {
    val result = fibonacci(10)
}
"#,
    ),
    program(
        LanguageId::Scala,
        "fibonacci",
        r#"object Main {
  def fibonacci(n: Int): Int = {
    if (n < 2) n else fibonacci(n - 1) + fibonacci(n - 2)
  }

  def main(args: Array[String]): Unit = {
    val result = fibonacci(10)
  }
}
"#,
    ),
    program(
        LanguageId::Lua,
        "fibonacci",
        r#"local function fibonacci(n)
  if n < 2 then
    return n
  end
  return fibonacci(n - 1) + fibonacci(n - 2)
end

local result = fibonacci(10)
"#,
    ),
    program(
        LanguageId::Pascal,
        "fibonacci",
        r#"program FibonacciDemo;

function Fibonacci(n: Integer): Integer;
begin
  if n < 2 then
    Fibonacci := n
  else
    Fibonacci := Fibonacci(n - 1) + Fibonacci(n - 2);
end;

begin
  WriteLn(Fibonacci(10));
end.
"#,
    ),
];

// ═══════════════════════════════════════════════════════════════════════════
// Primality (early return from a loop + modulo)
// ═══════════════════════════════════════════════════════════════════════════

pub static IS_PRIME: [Program; 15] = [
    program(
        LanguageId::Python,
        "is_prime",
        r#"def is_prime(n):
    if n < 2:
        return False
    i = 2
    while i * i <= n:
        if n % i == 0:
            return False
        i = i + 1
    return True

print(is_prime(97))
"#,
    ),
    program(
        LanguageId::JavaScript,
        "is_prime",
        r#"function isPrime(n) {
  if (n < 2) {
    return false;
  }
  let i = 2;
  while (i * i <= n) {
    if (n % i === 0) {
      return false;
    }
    i = i + 1;
  }
  return true;
}

console.log(isPrime(97));
"#,
    ),
    program(
        LanguageId::TypeScript,
        "is_prime",
        r#"function isPrime(n: number): boolean {
  if (n < 2) {
    return false;
  }
  let i: number = 2;
  while (i * i <= n) {
    if (n % i === 0) {
      return false;
    }
    i = i + 1;
  }
  return true;
}

console.log(isPrime(97));
"#,
    ),
    program(
        LanguageId::Java,
        "is_prime",
        r#"public class Main {
    static boolean isPrime(int n) {
        if (n < 2) {
            return false;
        }
        int i = 2;
        while (i * i <= n) {
            if (n % i == 0) {
                return false;
            }
            i = i + 1;
        }
        return true;
    }

    public static void main(String[] args) {
        System.out.println(isPrime(97));
    }
}
"#,
    ),
    program(
        LanguageId::Ruby,
        "is_prime",
        r#"def is_prime(n)
  if n < 2
    return false
  end
  i = 2
  while i * i <= n
    if n % i == 0
      return false
    end
    i = i + 1
  end
  return true
end

puts(is_prime(97))
"#,
    ),
    program(
        LanguageId::Go,
        "is_prime",
        r#"package main

import "fmt"

func isPrime(n int) bool {
	if n < 2 {
		return false
	}
	i := 2
	for i*i <= n {
		if n%i == 0 {
			return false
		}
		i = i + 1
	}
	return true
}

func main() {
	fmt.Println(isPrime(97))
}
"#,
    ),
    program(
        LanguageId::Php,
        "is_prime",
        r#"<?php
function isPrime($n) {
    if ($n < 2) {
        return false;
    }
    $i = 2;
    while ($i * $i <= $n) {
        if ($n % $i == 0) {
            return false;
        }
        $i = $i + 1;
    }
    return true;
}

echo isPrime(97);
"#,
    ),
    program(
        LanguageId::CSharp,
        "is_prime",
        r#"using System;

class Program {
    static bool IsPrime(int n) {
        if (n < 2) {
            return false;
        }
        int i = 2;
        while (i * i <= n) {
            if (n % i == 0) {
                return false;
            }
            i = i + 1;
        }
        return true;
    }

    static void Main() {
        Console.WriteLine(IsPrime(97));
    }
}
"#,
    ),
    program(
        LanguageId::C,
        "is_prime",
        r#"#include <stdio.h>

int is_prime(int n) {
    if (n < 2) {
        return 0;
    }
    int i = 2;
    while (i * i <= n) {
        if (n % i == 0) {
            return 0;
        }
        i = i + 1;
    }
    return 1;
}

int main() {
    printf("%d\n", is_prime(97));
    return 0;
}
"#,
    ),
    program(
        LanguageId::Cpp,
        "is_prime",
        r#"#include <cstdio>

bool is_prime(int n) {
    if (n < 2) {
        return false;
    }
    int i = 2;
    while (i * i <= n) {
        if (n % i == 0) {
            return false;
        }
        i = i + 1;
    }
    return true;
}

int main() {
    printf("%d\n", is_prime(97));
    return 0;
}
"#,
    ),
    program(
        LanguageId::Rust,
        "is_prime",
        r#"fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut i = 2;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i = i + 1;
    }
    true
}

fn main() {
    println!("{}", is_prime(97));
}
"#,
    ),
    program(
        LanguageId::Kotlin,
        "is_prime",
        r#"fun isPrime(n: Int): Boolean {
    if (n < 2) {
        return false
    }
    var i = 2
    while (i * i <= n) {
        if (n % i == 0) {
            return false
        }
        i = i + 1
    }
    return true
}

fun main() {
    println(isPrime(97))
}
"#,
    ),
    program(
        LanguageId::Scala,
        "is_prime",
        r#"object Main {
  def isPrime(n: Int): Boolean = {
    if (n < 2) return false
    var i = 2
    while (i * i <= n) {
      if (n % i == 0) return false
      i = i + 1
    }
    true
  }

  def main(args: Array[String]): Unit = {
    println(isPrime(97))
  }
}
"#,
    ),
    program(
        LanguageId::Lua,
        "is_prime",
        r#"local function is_prime(n)
  if n < 2 then
    return false
  end
  local i = 2
  while i * i <= n do
    if n % i == 0 then
      return false
    end
    i = i + 1
  end
  return true
end

print(is_prime(97))
"#,
    ),
    program(
        LanguageId::Pascal,
        "is_prime",
        r#"program PrimeDemo;

function IsPrime(n: Integer): Boolean;
var
  i: Integer;
begin
  IsPrime := n >= 2;
  i := 2;
  while i * i <= n do
  begin
    if n mod i = 0 then
      IsPrime := False;
    i := i + 1;
  end;
end;

begin
  WriteLn(IsPrime(97));
end.
"#,
    ),
];

/// Generator loops in both `for` shapes, the second with a guard and `yield`
pub static SCALA_COMPREHENSIONS: Program = program(
    LanguageId::Scala,
    "comprehensions",
    r#"object Main {
  def total(xs: Array[Int]): Int = {
    var sum = 0
    for (x <- xs) {
      sum = sum + x
    }
    sum
  }

  def doubledPositives(xs: Array[Int]): Array[Int] = for {
    x <- xs
    if x > 0
  } yield x * 2
}
"#,
);

/// Every suite above, one program per language each
pub fn all_suites() -> [&'static [Program; 15]; 6] {
    [&GCD, &FACTORIAL, &FIZZBUZZ, &BUBBLE_SORT, &FIBONACCI, &IS_PRIME]
}

pub fn all_programs() -> impl Iterator<Item = &'static Program> {
    all_suites()
        .into_iter()
        .flat_map(|suite| suite.iter())
        .chain(std::iter::once(&SCALA_COMPREHENSIONS))
}
